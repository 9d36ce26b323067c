use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde_json::{Value, json};

use super::slack::SlackAttachment;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[must_use]
pub fn webhook_payload(attachment: &SlackAttachment) -> Value {
    json!({ "attachments": [attachment] })
}

/// Slack incoming webhook.
pub struct SlackWebhook {
    http: Client,
    url: String,
}

impl SlackWebhook {
    pub fn new(url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    pub fn post(&self, attachment: &SlackAttachment) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .json(&webhook_payload(attachment))
            .send()
            .context("failed to reach Slack webhook")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("Slack webhook error ({status}): {body}");
        }
        Ok(())
    }
}
