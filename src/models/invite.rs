use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

impl InviteStatus {
    pub const ALL: [InviteStatus; 4] = [
        InviteStatus::Pending,
        InviteStatus::Accepted,
        InviteStatus::Expired,
        InviteStatus::Revoked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Expired => "expired",
            InviteStatus::Revoked => "revoked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanerInvite {
    pub id: String,
    pub company_id: String,
    pub invited_by: String,
    pub email: Option<String>,
    pub token: String,
    pub status: InviteStatus,
    pub expires_at: NaiveDateTime,
    pub accepted_by: Option<String>,
    pub accepted_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl CleanerInvite {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now >= self.expires_at
    }

    /// Pending and not yet past its expiry.
    pub fn is_usable(&self, now: NaiveDateTime) -> bool {
        self.status == InviteStatus::Pending && !self.is_expired(now)
    }

    /// Whether `email` may accept this invite. Open invites accept anyone.
    pub fn is_addressed_to(&self, email: &str) -> bool {
        match &self.email {
            Some(target) => target.trim().eq_ignore_ascii_case(email.trim()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(expires_in: Duration) -> CleanerInvite {
        let now = chrono::Utc::now().naive_utc();
        CleanerInvite {
            id: "i1".to_string(),
            company_id: "c1".to_string(),
            invited_by: "u1".to_string(),
            email: Some("Ana@Example.com".to_string()),
            token: "tok".to_string(),
            status: InviteStatus::Pending,
            expires_at: now + expires_in,
            accepted_by: None,
            accepted_at: None,
            created_at: now,
        }
    }

    #[test]
    fn test_is_expired() {
        let now = chrono::Utc::now().naive_utc();
        assert!(!invite(Duration::days(7)).is_expired(now));
        assert!(invite(Duration::days(-1)).is_expired(now));

        let i = invite(Duration::days(1));
        assert!(i.is_expired(i.expires_at));
    }

    #[test]
    fn test_usable_requires_pending() {
        let now = chrono::Utc::now().naive_utc();
        for status in InviteStatus::ALL {
            let mut i = invite(Duration::days(1));
            i.status = status;
            assert_eq!(i.is_usable(now), status == InviteStatus::Pending);
        }
    }

    #[test]
    fn test_addressed_to_ignores_case() {
        let i = invite(Duration::days(1));
        assert!(i.is_addressed_to("ana@example.com"));
        assert!(!i.is_addressed_to("bob@example.com"));

        let mut open = invite(Duration::days(1));
        open.email = None;
        assert!(open.is_addressed_to("anyone@example.com"));
    }
}
