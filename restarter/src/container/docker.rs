use async_trait::async_trait;
use bollard::container::{LogOutput, LogsOptions};
use bollard::errors::Error as BollardError;
use bollard::Docker;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{debug, error, info};

use super::lines::split_lines;
use super::{ContainerHandle, LogLineStream};
use crate::errors::ContainerError;

/// A single Docker container, resolved once at startup.
pub struct DockerContainer {
    docker: Docker,
    name: String,
}

impl DockerContainer {
    /// Connect to the local daemon and make sure `name` exists.
    pub async fn connect(name: &str) -> Result<Self, ContainerError> {
        let docker = Docker::connect_with_local_defaults()?;

        match docker.inspect_container(name, None).await {
            Ok(info) => {
                let status = info
                    .state
                    .and_then(|s| s.status)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                info!("Attached to container '{}' (status: {})", name, status);
                Ok(Self {
                    docker,
                    name: name.to_string(),
                })
            }
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => Err(ContainerError::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ContainerHandle for DockerContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_running(&self) -> bool {
        match self.docker.inspect_container(&self.name, None).await {
            Ok(info) => info.state.and_then(|s| s.running).unwrap_or(false),
            Err(e) => {
                error!("Failed to inspect container '{}': {}", self.name, e);
                false
            }
        }
    }

    async fn restart(&self) -> Result<(), ContainerError> {
        info!("Restarting container '{}'", self.name);
        self.docker
            .restart_container(&self.name, None)
            .await
            .map_err(|e| ContainerError::RestartFailed {
                name: self.name.clone(),
                reason: e.to_string(),
            })
    }

    fn stream_log_lines(&self, since: DateTime<Utc>) -> LogLineStream {
        debug!(
            "Following logs of '{}' since {}",
            self.name,
            since.to_rfc3339()
        );

        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            since: since.timestamp(),
            tail: "all".to_string(),
            ..Default::default()
        };

        let name = self.name.clone();
        let chunks = self
            .docker
            .logs(&self.name, Some(options))
            .map(move |chunk| {
                chunk
                    .map(LogOutput::into_bytes)
                    .map_err(|e| ContainerError::LogStream {
                        name: name.clone(),
                        reason: e.to_string(),
                    })
            })
            .boxed();

        split_lines(&self.name, chunks)
    }
}
