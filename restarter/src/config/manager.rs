use super::Config;
use crate::errors::ConfigError;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    /// Load `<config_dir>/main.toml` (optional) and overlay the process environment.
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir, |key| std::env::var(key).ok()).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    pub async fn load_configuration<F>(config_dir: &str, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let main_config_path = format!("{}/main.toml", config_dir);

        let mut config = if Path::new(&main_config_path).exists() {
            debug!("Loading config file: {}", main_config_path);
            let content = fs::read_to_string(&main_config_path).await.map_err(|e| {
                ConfigError::LoadFailed {
                    path: main_config_path.clone(),
                    reason: e.to_string(),
                }
            })?;
            toml::from_str::<Config>(&content).map_err(|e| ConfigError::ParseError {
                reason: format!("{}: {}", main_config_path, e),
            })?
        } else {
            debug!(
                "No config file at {}, using environment only",
                main_config_path
            );
            Config::default()
        };

        apply_env_overrides(&mut config, lookup)?;
        config.validate()?;

        info!(
            "Configuration loaded: container '{}', RCON {}, restart every {}h, notify every {}m",
            config.container,
            config.rcon_address(),
            config.restart_interval_hours,
            config.notify_interval_minutes
        );

        Ok(config)
    }
}

/// Environment variables take precedence over the config file.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("RCON_IP") {
        config.rcon_host = value;
    }
    if let Some(value) = lookup("RCON_PORT") {
        config.rcon_port = parse_number("RCON_PORT", &value)?;
    }
    if let Some(value) = lookup("RCON_PASSWORD") {
        config.rcon_password = value;
    }
    if let Some(value) = lookup("DOCKER_CONTAINER") {
        config.container = value;
    }
    if let Some(value) = lookup("DISCORD_WEBHOOK") {
        config.webhook_url = value;
    }
    if let Some(value) = lookup("WEBHOOK_USERNAME") {
        config.webhook_username = value;
    }
    if let Some(value) = lookup("WEBHOOK_AUTHOR") {
        config.webhook_author = Some(value);
    }
    if let Some(value) = lookup("LOG_LEVEL") {
        config.log_level = value.to_lowercase();
    }
    if let Some(value) = lookup("RESTART_INTERVAL_HOURS") {
        config.restart_interval_hours = parse_number("RESTART_INTERVAL_HOURS", &value)?;
    }
    if let Some(value) = lookup("NOTIFY_INTERVAL_MINUTES") {
        config.notify_interval_minutes = parse_number("NOTIFY_INTERVAL_MINUTES", &value)?;
    }
    if let Some(value) = lookup("READINESS_TIMEOUT_SECONDS") {
        config.readiness_timeout_seconds = parse_number("READINESS_TIMEOUT_SECONDS", &value)?;
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}': {}", value, e),
        })
}
