use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::company::CompanyType;
use super::user::Role;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    Cleaner,
    CompanyAdmin,
}

impl ApplicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationType::Cleaner => "cleaner",
            ApplicationType::CompanyAdmin => "company_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cleaner" => Some(ApplicationType::Cleaner),
            "company_admin" => Some(ApplicationType::CompanyAdmin),
            _ => None,
        }
    }

    /// Role granted when an application of this type is approved.
    pub fn granted_role(&self) -> Role {
        match self {
            ApplicationType::Cleaner => Role::Cleaner,
            ApplicationType::CompanyAdmin => Role::CompanyAdmin,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub company_type: CompanyType,
    pub registration_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationDocuments {
    pub identity_document_url: Option<String>,
    pub business_registration_url: Option<String>,
    pub insurance_document_url: Option<String>,
    #[serde(default)]
    pub additional_documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub user_id: String,
    pub application_type: ApplicationType,
    pub status: ApplicationStatus,
    pub company: Option<CompanyInfo>,
    pub documents: ApplicationDocuments,
    pub message: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granted_roles() {
        assert_eq!(ApplicationType::Cleaner.granted_role(), Role::Cleaner);
        assert_eq!(
            ApplicationType::CompanyAdmin.granted_role(),
            Role::CompanyAdmin
        );
    }

    #[test]
    fn test_type_and_status_names() {
        for t in [ApplicationType::Cleaner, ApplicationType::CompanyAdmin] {
            assert_eq!(ApplicationType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ApplicationType::parse("partner"), None);

        for s in [
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(ApplicationStatus::parse(s.as_str()), Some(s));
        }
    }
}
