//! Mock webhook server for testing notification delivery
//!
//! This simulates a Discord-style webhook endpoint, allowing tests to verify
//! what the notifier posts.

use serde_json::Value;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock webhook server that records notification requests
pub struct MockWebhookServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockWebhookServer {
    /// Create a new mock webhook server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();

        Self { server, base_url }
    }

    /// Mock successful webhook delivery (Discord answers 204)
    pub async fn mock_success(&self) {
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
    }

    /// Mock webhook failure
    pub async fn mock_failure(&self, status_code: u16) {
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(status_code))
            .mount(&self.server)
            .await;
    }

    /// Mock a webhook that answers slower than the client timeout
    pub async fn mock_slow(&self, delay: std::time::Duration) {
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(204).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of every request received so far
    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|req| req.body_json::<Value>().ok())
            .collect()
    }

    /// Get the number of webhook requests received
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Get the webhook URL
    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.base_url)
    }

    /// Verify an embed with this description was posted
    pub async fn assert_embed_sent(&self, description: &str) -> bool {
        self.received_bodies().await.iter().any(|body| {
            body.get("embeds")
                .and_then(|embeds| embeds.get(0))
                .and_then(|embed| embed.get("description"))
                .and_then(|v| v.as_str())
                .map(|v| v == description)
                .unwrap_or(false)
        })
    }
}
