pub mod manager;
use serde::{Deserialize, Serialize};
use std::time::Duration;
pub use manager::ConfigManager;

use crate::constants::{notify, rcon, restart};
use crate::errors::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rcon_host: String,
    #[serde(default = "default_rcon_port")]
    pub rcon_port: u16,
    #[serde(default)]
    pub rcon_password: String,
    /// Name or id of the managed container
    #[serde(default)]
    pub container: String,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_webhook_username")]
    pub webhook_username: String,
    pub webhook_author: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_restart_interval_hours")]
    pub restart_interval_hours: u64,
    #[serde(default = "default_notify_interval_minutes")]
    pub notify_interval_minutes: u64,
    /// 0 waits for the readiness line forever
    #[serde(default = "default_readiness_timeout_seconds")]
    pub readiness_timeout_seconds: u64,
}

fn default_rcon_port() -> u16 {
    rcon::DEFAULT_PORT
}

fn default_webhook_username() -> String {
    notify::DEFAULT_USERNAME.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_restart_interval_hours() -> u64 {
    restart::DEFAULT_RESTART_INTERVAL_HOURS
}

fn default_notify_interval_minutes() -> u64 {
    restart::DEFAULT_NOTIFY_INTERVAL_MINUTES
}

fn default_readiness_timeout_seconds() -> u64 {
    restart::DEFAULT_READINESS_TIMEOUT_SECONDS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rcon_host: String::new(),
            rcon_port: default_rcon_port(),
            rcon_password: String::new(),
            container: String::new(),
            webhook_url: String::new(),
            webhook_username: default_webhook_username(),
            webhook_author: None,
            log_level: default_log_level(),
            restart_interval_hours: default_restart_interval_hours(),
            notify_interval_minutes: default_notify_interval_minutes(),
            readiness_timeout_seconds: default_readiness_timeout_seconds(),
        }
    }
}

impl Config {
    pub fn restart_interval(&self) -> Duration {
        Duration::from_secs(self.restart_interval_hours.saturating_mul(3600))
    }

    pub fn notify_interval(&self) -> Duration {
        Duration::from_secs(self.notify_interval_minutes.saturating_mul(60))
    }

    pub fn readiness_timeout(&self) -> Option<Duration> {
        match self.readiness_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn rcon_address(&self) -> String {
        format!("{}:{}", self.rcon_host, self.rcon_port)
    }

    /// Author shown on webhook embeds; falls back to the container name.
    pub fn webhook_author(&self) -> String {
        self.webhook_author
            .clone()
            .filter(|author| !author.is_empty())
            .unwrap_or_else(|| self.container.clone())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("rcon_host", &self.rcon_host),
            ("rcon_password", &self.rcon_password),
            ("container", &self.container),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: field.to_string(),
                });
            }
        }

        if self.rcon_port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rcon_port".to_string(),
                reason: "port must be non-zero".to_string(),
            });
        }

        if self.restart_interval_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "restart_interval_hours".to_string(),
                reason: "must be at least 1 hour".to_string(),
            });
        }

        if self.restart_interval_hours > restart::MAX_RESTART_INTERVAL_HOURS {
            return Err(ConfigError::InvalidValue {
                field: "restart_interval_hours".to_string(),
                reason: format!(
                    "{} hours exceeds the maximum of {}",
                    self.restart_interval_hours,
                    restart::MAX_RESTART_INTERVAL_HOURS
                ),
            });
        }

        if self.notify_interval_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "notify_interval_minutes".to_string(),
                reason: "must be at least 1 minute".to_string(),
            });
        }

        if self.notify_interval() >= self.restart_interval() {
            return Err(ConfigError::InvalidValue {
                field: "notify_interval_minutes".to_string(),
                reason: format!(
                    "{} minutes is not shorter than the {} hour restart interval",
                    self.notify_interval_minutes, self.restart_interval_hours
                ),
            });
        }

        Ok(())
    }
}
