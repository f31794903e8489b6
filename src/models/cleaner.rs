use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Pricing bracket of a cleaner. Each tier bounds the hourly rate (bani).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    New,
    Standard,
    Premium,
    Pro,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::New, Tier::Standard, Tier::Premium, Tier::Pro];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::New => "new",
            Tier::Standard => "standard",
            Tier::Premium => "premium",
            Tier::Pro => "pro",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn min_rate(&self) -> i64 {
        match self {
            Tier::New => 4000,
            Tier::Standard => 5000,
            Tier::Premium => 7000,
            Tier::Pro => 10000,
        }
    }

    pub fn max_rate(&self) -> i64 {
        match self {
            Tier::New => 5000,
            Tier::Standard => 7000,
            Tier::Premium => 10000,
            Tier::Pro => 15000,
        }
    }

    /// Inclusive on both ends.
    pub fn is_rate_valid(&self, rate: i64) -> bool {
        (self.min_rate()..=self.max_rate()).contains(&rate)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanerProfile {
    pub id: String,
    pub user_id: String,
    pub company_id: Option<String>,
    pub tier: Tier,
    pub hourly_rate: i64,
    pub bio: Option<String>,
    pub is_active: bool,
    pub total_bookings: i64,
    pub completed_bookings: i64,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CleanerProfile {
    /// A fresh `new`-tier profile at the bottom of the tier's range.
    pub fn new_for_user(user_id: &str, company_id: Option<String>, now: NaiveDateTime) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            company_id,
            tier: Tier::New,
            hourly_rate: Tier::New.min_rate(),
            bio: None,
            is_active: true,
            total_bookings: 0,
            completed_bookings: 0,
            average_rating: 0.0,
            total_reviews: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
