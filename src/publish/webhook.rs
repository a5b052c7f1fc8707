//! Chat webhook delivery.

use crate::error::DeliveryError;
use crate::report::ChatPayload;
use std::time::Duration;
use tracing::{debug, info};

/// Posts chat payloads to a single webhook URL.
pub struct WebhookPublisher {
    http_client: reqwest::Client,
    url: String,
}

impl WebhookPublisher {
    pub fn new(url: String, timeout_seconds: u64) -> Result<Self, DeliveryError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { http_client, url })
    }

    /// POST the payload; any non-success status is an error.
    pub async fn send(&self, payload: &ChatPayload) -> Result<(), DeliveryError> {
        debug!("Posting digest to webhook");

        let response = self.http_client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::WebhookStatus(status, body));
        }

        info!("Webhook accepted digest ({})", status);
        Ok(())
    }
}
