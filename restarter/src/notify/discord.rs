use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{NotificationSink, Severity};
use crate::constants::notify::WEBHOOK_TIMEOUT_SECONDS;

#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub description: String,
    pub color: u32,
    pub author: EmbedAuthor,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
}

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook_url: String,
    username: String,
    author: String,
    client: Client,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String, username: String, author: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            webhook_url,
            username,
            author,
            client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    pub fn build_payload(&self, message: &str, severity: Severity) -> WebhookPayload {
        WebhookPayload {
            username: self.username.clone(),
            embeds: vec![Embed {
                description: message.to_string(),
                color: severity.color(),
                author: EmbedAuthor {
                    name: self.author.clone(),
                },
                timestamp: Utc::now(),
            }],
        }
    }

    /// Startup probe; unlike `notify` this reports failures.
    pub async fn test_webhook(&self) -> Result<()> {
        if !self.is_enabled() {
            return Err(anyhow!("No webhook URL configured"));
        }

        let payload = self.build_payload("Restart manager started", Severity::Debug);
        let response = timeout(
            Duration::from_secs(WEBHOOK_TIMEOUT_SECONDS),
            self.client.post(&self.webhook_url).json(&payload).send(),
        )
        .await
        .map_err(|_| anyhow!("Webhook test timed out"))?
        .map_err(|e| anyhow!("Webhook test request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("Webhook returned status: {}", response.status()));
        }
        Ok(())
    }

    async fn send_webhook(&self, payload: &WebhookPayload, severity: Severity) {
        match timeout(
            Duration::from_secs(WEBHOOK_TIMEOUT_SECONDS),
            self.client.post(&self.webhook_url).json(payload).send(),
        )
        .await
        {
            Ok(Ok(response)) => {
                if response.status().is_success() {
                    info!("Notification sent ({})", severity);
                } else {
                    warn!("Notification webhook returned status: {}", response.status());
                }
            }
            Ok(Err(e)) => {
                warn!("Failed to send notification: {}", e);
            }
            Err(_) => {
                warn!("Notification webhook timeout");
            }
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordNotifier {
    async fn notify(&self, message: &str, severity: Severity) {
        if !self.is_enabled() {
            debug!("No webhook URL configured, skipping notification: {}", message);
            return;
        }

        let payload = self.build_payload(message, severity);
        self.send_webhook(&payload, severity).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_matches_discord_embed_shape() {
        let notifier = DiscordNotifier::new(
            "http://localhost/webhook".to_string(),
            "ny1-vps".to_string(),
            "palworld".to_string(),
        );
        let payload = serde_json::to_value(notifier.build_payload("Server restarting...", Severity::Info))
            .unwrap();

        assert_eq!(payload["username"], "ny1-vps");
        let embed = &payload["embeds"][0];
        assert_eq!(embed["description"], "Server restarting...");
        assert_eq!(embed["color"], 0x00FF00);
        assert_eq!(embed["author"]["name"], "palworld");
        assert!(embed["timestamp"].is_string());
    }

    #[tokio::test]
    async fn disabled_notifier_does_nothing() {
        let notifier = DiscordNotifier::new(String::new(), "u".to_string(), "a".to_string());
        assert!(!notifier.is_enabled());
        notifier.notify("ignored", Severity::Critical).await;
        assert!(notifier.test_webhook().await.is_err());
    }
}
