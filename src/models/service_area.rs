use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceArea {
    pub id: String,
    pub cleaner_profile_id: String,
    pub city: String,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    pub travel_fee: i64,
    pub is_preferred: bool,
    pub created_at: NaiveDateTime,
}

impl ServiceArea {
    /// An area with neither neighborhood nor postal code covers the whole city.
    pub fn is_city_wide(&self) -> bool {
        blank(self.neighborhood.as_deref()) && blank(self.postal_code.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub id: String,
    pub user_id: String,
    pub street: String,
    pub city: String,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
}

fn blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}
