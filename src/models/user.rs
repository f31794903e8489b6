use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    PendingApplication,
    PendingCleaner,
    RejectedCleaner,
    Cleaner,
    CompanyAdmin,
    GlobalAdmin,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Client,
        Role::PendingApplication,
        Role::PendingCleaner,
        Role::RejectedCleaner,
        Role::Cleaner,
        Role::CompanyAdmin,
        Role::GlobalAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::PendingApplication => "pending_application",
            Role::PendingCleaner => "pending_cleaner",
            Role::RejectedCleaner => "rejected_cleaner",
            Role::Cleaner => "cleaner",
            Role::CompanyAdmin => "company_admin",
            Role::GlobalAdmin => "global_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    pub fn is_global_admin(&self) -> bool {
        *self == Role::GlobalAdmin
    }

    pub fn is_company_admin(&self) -> bool {
        *self == Role::CompanyAdmin
    }

    pub fn is_cleaner(&self) -> bool {
        *self == Role::Cleaner
    }

    pub fn is_client(&self) -> bool {
        *self == Role::Client
    }

    pub fn is_pending_cleaner(&self) -> bool {
        *self == Role::PendingCleaner
    }

    pub fn is_rejected_cleaner(&self) -> bool {
        *self == Role::RejectedCleaner
    }

    /// Transitions a user may request for themselves, outside the
    /// application workflow.
    pub fn can_self_transition_to(&self, target: Role) -> bool {
        matches!(
            (self, target),
            (Role::Client, Role::PendingApplication)
                | (Role::RejectedCleaner, Role::PendingApplication)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}
