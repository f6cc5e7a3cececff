//! Lifecycle notifications sent outside the process

pub mod discord;

pub use discord::DiscordNotifier;

use async_trait::async_trait;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Error,
    Critical,
}

impl Severity {
    /// Embed colour as a 24-bit RGB value
    pub fn color(&self) -> u32 {
        match self {
            Severity::Debug => 0xFFFFFF,
            Severity::Info => 0x00FF00,
            Severity::Error => 0xFF0000,
            Severity::Critical => 0x800000,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// Delivery failures stay inside the sink.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &str, severity: Severity);
}
