pub mod sidemail;
pub mod slack;

use async_trait::async_trait;
use serde::Serialize;

/// Events worth telling someone about once they have been committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    ApplicationSubmitted {
        application_id: String,
        applicant_email: String,
        application_type: String,
    },
    ApplicationApproved {
        applicant_email: String,
        application_type: String,
    },
    ApplicationRejected {
        applicant_email: String,
        reason: Option<String>,
    },
    BookingCreated {
        booking_id: String,
        customer_email: String,
        scheduled_for: String,
        total_price: i64,
    },
    BookingStatusChanged {
        booking_id: String,
        customer_email: String,
        status: String,
    },
    InviteCreated {
        company_name: String,
        email: Option<String>,
        link: String,
    },
    InviteAccepted {
        company_name: String,
        cleaner_email: String,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ApplicationSubmitted { .. } => "application_submitted",
            Notification::ApplicationApproved { .. } => "application_approved",
            Notification::ApplicationRejected { .. } => "application_rejected",
            Notification::BookingCreated { .. } => "booking_created",
            Notification::BookingStatusChanged { .. } => "booking_status_changed",
            Notification::InviteCreated { .. } => "invite_created",
            Notification::InviteAccepted { .. } => "invite_accepted",
        }
    }

    /// One-line summary for operator channels.
    pub fn summary(&self) -> String {
        match self {
            Notification::ApplicationSubmitted {
                applicant_email,
                application_type,
                ..
            } => format!("New {application_type} application from {applicant_email}"),
            Notification::ApplicationApproved {
                applicant_email,
                application_type,
            } => format!("Approved {application_type} application for {applicant_email}"),
            Notification::ApplicationRejected { applicant_email, .. } => {
                format!("Rejected application for {applicant_email}")
            }
            Notification::BookingCreated {
                booking_id,
                scheduled_for,
                total_price,
                ..
            } => format!("Booking {booking_id} created for {scheduled_for} ({total_price} bani)"),
            Notification::BookingStatusChanged {
                booking_id, status, ..
            } => format!("Booking {booking_id} is now {status}"),
            Notification::InviteCreated { company_name, email, .. } => match email {
                Some(email) => format!("{company_name} invited {email}"),
                None => format!("{company_name} created an open invite"),
            },
            Notification::InviteAccepted {
                company_name,
                cleaner_email,
            } => format!("{cleaner_email} joined {company_name}"),
        }
    }

    /// The end user this event should be e-mailed to, if any.
    pub fn recipient(&self) -> Option<&str> {
        match self {
            Notification::ApplicationApproved { applicant_email, .. }
            | Notification::ApplicationRejected { applicant_email, .. } => Some(applicant_email),
            Notification::BookingCreated { customer_email, .. }
            | Notification::BookingStatusChanged { customer_email, .. } => Some(customer_email),
            Notification::InviteCreated { email, .. } => email.as_deref(),
            Notification::ApplicationSubmitted { .. } | Notification::InviteAccepted { .. } => None,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Sends to every notifier in turn. Failures are logged and swallowed so a
/// side channel can never fail the operation that triggered it.
pub async fn dispatch(notifiers: &[Box<dyn Notifier>], notification: &Notification) {
    for notifier in notifiers {
        if let Err(e) = notifier.notify(notification).await {
            tracing::warn!(
                notifier = notifier.name(),
                event = notification.kind(),
                "notification failed: {e:#}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn notify(&self, _notification: &Notification) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("boom"))
        }
    }

    struct Recording(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl Notifier for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(notification.kind().to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_other_notifiers() {
        let seen = Arc::new(Mutex::new(vec![]));
        let notifiers: Vec<Box<dyn Notifier>> =
            vec![Box::new(Failing), Box::new(Recording(Arc::clone(&seen)))];

        let event = Notification::InviteAccepted {
            company_name: "Sparkle".to_string(),
            cleaner_email: "ana@example.com".to_string(),
        };
        dispatch(&notifiers, &event).await;

        assert_eq!(*seen.lock().unwrap(), vec!["invite_accepted".to_string()]);
    }

    #[tokio::test]
    async fn test_no_notifiers_is_a_no_op() {
        let event = Notification::ApplicationRejected {
            applicant_email: "ana@example.com".to_string(),
            reason: None,
        };
        dispatch(&[], &event).await;
    }

    #[test]
    fn test_recipients() {
        let open = Notification::InviteCreated {
            company_name: "Sparkle".to_string(),
            email: None,
            link: "http://localhost/invite/abc".to_string(),
        };
        assert_eq!(open.recipient(), None);

        let changed = Notification::BookingStatusChanged {
            booking_id: "b1".to_string(),
            customer_email: "ana@example.com".to_string(),
            status: "confirmed".to_string(),
        };
        assert_eq!(changed.recipient(), Some("ana@example.com"));
        assert_eq!(changed.summary(), "Booking b1 is now confirmed");
    }
}
