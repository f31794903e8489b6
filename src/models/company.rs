use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    Individual,
    Business,
}

impl CompanyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyType::Individual => "individual",
            CompanyType::Business => "business",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "individual" => Some(CompanyType::Individual),
            "business" => Some(CompanyType::Business),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub company_type: CompanyType,
    pub registration_number: Option<String>,
    pub admin_user_id: Option<String>,
    pub total_cleaners: i64,
    pub active_cleaners: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
