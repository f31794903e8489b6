use anyhow::Context;
use async_trait::async_trait;

use super::{Notification, Notifier};

/// Posts every event to an incoming-webhook channel for operators.
pub struct SlackNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let body = serde_json::json!({ "text": notification.summary() });

        self.client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("failed to call Slack webhook")?
            .error_for_status()
            .context("Slack webhook returned error")?;

        Ok(())
    }
}
