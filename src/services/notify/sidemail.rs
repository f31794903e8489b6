use anyhow::Context;
use async_trait::async_trait;

use super::{Notification, Notifier};

const SIDEMAIL_SEND_URL: &str = "https://api.sidemail.io/v1/email/send";

/// Transactional e-mail to the end user an event concerns. Events without a
/// recipient are skipped.
pub struct SidemailNotifier {
    api_key: String,
    from_address: String,
    base_url: String,
    client: reqwest::Client,
}

impl SidemailNotifier {
    pub fn new(api_key: String, from_address: String, base_url: String) -> Self {
        Self {
            api_key,
            from_address,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn subject(notification: &Notification) -> &'static str {
        match notification {
            Notification::ApplicationApproved { .. } => "Your application was approved",
            Notification::ApplicationRejected { .. } => "Update on your application",
            Notification::BookingCreated { .. } => "Your booking request was received",
            Notification::BookingStatusChanged { .. } => "Your booking was updated",
            Notification::InviteCreated { .. } => "You have been invited to join a cleaning team",
            Notification::ApplicationSubmitted { .. } | Notification::InviteAccepted { .. } => {
                "Notification"
            }
        }
    }

    fn text(&self, notification: &Notification) -> String {
        match notification {
            Notification::InviteCreated {
                company_name, link, ..
            } => format!("{company_name} invited you to join as a cleaner.\n\nAccept here: {link}"),
            Notification::ApplicationRejected {
                reason: Some(reason),
                ..
            } => format!("Your application was not approved.\n\nReason: {reason}"),
            other => format!("{}\n\n{}", other.summary(), self.base_url),
        }
    }
}

#[async_trait]
impl Notifier for SidemailNotifier {
    fn name(&self) -> &'static str {
        "sidemail"
    }

    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let Some(to) = notification.recipient() else {
            return Ok(());
        };

        let body = serde_json::json!({
            "toAddress": to,
            "fromAddress": self.from_address,
            "subject": Self::subject(notification),
            "text": self.text(notification),
        });

        self.client
            .post(SIDEMAIL_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to send Sidemail e-mail")?
            .error_for_status()
            .context("Sidemail API returned error")?;

        tracing::info!(to = %to, event = notification.kind(), "e-mail sent");
        Ok(())
    }
}
