//! Custom error types for the restarter
//!
//! Errors are split by collaborator so callers can tell a recoverable console
//! hiccup from the one failure that must abort a restart job.

use std::fmt;
use std::time::Duration;

/// Main error type for the restarter
#[derive(Debug)]
pub enum RestarterError {
    /// Remote console errors
    Rcon(RconError),

    /// Container runtime errors
    Container(ContainerError),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Missing required configuration
    MissingRequired { field: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

/// Remote console error variants
#[derive(Debug)]
pub enum RconError {
    /// Command or I/O failure on an established connection
    Transport { reason: String },

    /// The managed container is not running
    NotRunning { container: String },

    /// Every connection attempt failed
    ConnectionExhausted { attempts: u32, last_error: String },

    /// Server sent something that is not a valid RCON packet
    Protocol { reason: String },

    /// Server rejected the password
    AuthenticationFailed { host: String },
}

/// Container runtime error variants
#[derive(Debug)]
pub enum ContainerError {
    /// Runtime daemon could not be reached
    Unavailable { reason: String },

    /// No container with this name
    NotFound { name: String },

    /// Restart request was rejected
    RestartFailed { name: String, reason: String },

    /// Log stream returned an error
    LogStream { name: String, reason: String },
}

/// Readiness detection error variants
#[derive(Debug)]
pub enum ReadinessError {
    /// The sentinel line did not appear in time
    TimedOut { waited: Duration, lines: usize },
}

impl RconError {
    /// Only an exhausted retry budget aborts a restart sequence.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RconError::ConnectionExhausted { .. })
    }
}

impl fmt::Display for RestarterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestarterError::Rcon(e) => write!(f, "RCON error: {}", e),
            RestarterError::Container(e) => write!(f, "Container error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required field: {}", field)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl fmt::Display for RconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RconError::Transport { reason } => write!(f, "Transport failure: {}", reason),
            RconError::NotRunning { container } => {
                write!(f, "Container '{}' is not running", container)
            }
            RconError::ConnectionExhausted {
                attempts,
                last_error,
            } => {
                write!(
                    f,
                    "Unable to establish RCON connection after {} attempts: {}",
                    attempts, last_error
                )
            }
            RconError::Protocol { reason } => write!(f, "Protocol error: {}", reason),
            RconError::AuthenticationFailed { host } => {
                write!(f, "Authentication failed for {}", host)
            }
        }
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::Unavailable { reason } => {
                write!(f, "Container runtime unavailable: {}", reason)
            }
            ContainerError::NotFound { name } => write!(f, "Container '{}' not found", name),
            ContainerError::RestartFailed { name, reason } => {
                write!(f, "Failed to restart '{}': {}", name, reason)
            }
            ContainerError::LogStream { name, reason } => {
                write!(f, "Log stream for '{}' failed: {}", name, reason)
            }
        }
    }
}

impl fmt::Display for ReadinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessError::TimedOut { waited, lines } => {
                write!(
                    f,
                    "Server did not report ready within {}s ({} log lines read)",
                    waited.as_secs(),
                    lines
                )
            }
        }
    }
}

impl std::error::Error for RestarterError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for RconError {}
impl std::error::Error for ContainerError {}
impl std::error::Error for ReadinessError {}

impl From<RconError> for RestarterError {
    fn from(err: RconError) -> Self {
        RestarterError::Rcon(err)
    }
}

impl From<ContainerError> for RestarterError {
    fn from(err: ContainerError) -> Self {
        RestarterError::Container(err)
    }
}

impl From<std::io::Error> for RconError {
    fn from(err: std::io::Error) -> Self {
        RconError::Transport {
            reason: err.to_string(),
        }
    }
}

impl From<bollard::errors::Error> for ContainerError {
    fn from(err: bollard::errors::Error) -> Self {
        ContainerError::Unavailable {
            reason: err.to_string(),
        }
    }
}
