//! This module provides reusable test utilities:
//! - Mock webhook server
//! - Test configuration builders
//! - A restart manager wired to in-memory fakes

// Allow unused code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod harness;
pub mod mock_webhook;
pub mod test_config;

// Re-export commonly used items
pub use harness::{boot_log, fast_retry, Harness, CONTAINER_NAME, SENTINEL_LINE};
pub use mock_webhook::MockWebhookServer;
pub use test_config::TestConfigBuilder;
