//! Notification collaborator
//!
//! Publishing terminals deliver a report to a recipient. Delivery
//! failures are soft: the engine records them on the node result and
//! keeps going.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::error::{Result, StrixError};
use crate::util::{API_TIMEOUT, CONNECT_TIMEOUT};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a workflow report to a recipient
    async fn send_report(
        &self,
        recipient: &str,
        target: &str,
        status: &str,
        report: &str,
    ) -> Result<()>;
}

/// POSTs the report JSON to a configured gateway URL (mail relay,
/// Slack-compatible webhook, ...)
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(API_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent("strix/0.3")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_report(
        &self,
        recipient: &str,
        target: &str,
        status: &str,
        report: &str,
    ) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "recipient": recipient,
                "target": target,
                "status": status,
                "report": report,
            }))
            .send()
            .await
            .map_err(|e| StrixError::Notify { reason: e.to_string() })?;

        if !response.status().is_success() {
            return Err(StrixError::Notify {
                reason: format!("gateway returned {}", response.status()),
            });
        }
        Ok(())
    }
}
