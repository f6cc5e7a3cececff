use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

use super::connector::{RconConnector, RconSession};
use crate::constants::rcon::{MAX_RETRIES, PROBE_COMMAND, RETRY_DELAY};
use crate::container::ContainerHandle;
use crate::errors::RconError;

/// Fixed-delay retry budget for opening a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            delay: RETRY_DELAY,
        }
    }
}

/// What `ensure_connected` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Container is down; no attempt was made.
    ContainerNotRunning,
    /// Existing session answered the probe.
    Reused,
    /// A new session was opened.
    Established,
}

/// Console client owning at most one live session.
///
/// Liveness is never cached: every call probes the current session and
/// replaces it wholesale when the probe fails.
pub struct RconClient {
    connector: Arc<dyn RconConnector>,
    container: Arc<dyn ContainerHandle>,
    policy: RetryPolicy,
    session: Option<Box<dyn RconSession>>,
}

impl RconClient {
    pub fn new(
        connector: Arc<dyn RconConnector>,
        container: Arc<dyn ContainerHandle>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            connector,
            container,
            policy,
            session: None,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Make sure a working session exists, unless the container is down.
    ///
    /// A stopped container is not an error here: the caller's command will
    /// fail on its own and be logged there.
    pub async fn ensure_connected(&mut self) -> Result<ConnectionStatus, RconError> {
        if !self.container.is_running().await {
            error!("Container not running. Cannot establish RCON connection.");
            return Ok(ConnectionStatus::ContainerNotRunning);
        }

        if self.is_connected().await {
            return Ok(ConnectionStatus::Reused);
        }

        self.connect().await?;
        Ok(ConnectionStatus::Established)
    }

    /// Probe the current session with a no-op command.
    pub async fn is_connected(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        match session.command(PROBE_COMMAND).await {
            Ok(_) => true,
            Err(e) => {
                debug!("RCON liveness probe failed: {}", e);
                false
            }
        }
    }

    /// Open a new session, retrying with a fixed delay.
    ///
    /// Sleeps between attempts but not after the last one. Exhausting the
    /// budget is the only error this client ever surfaces.
    pub async fn connect(&mut self) -> Result<(), RconError> {
        self.session = None;
        let max_attempts = self.policy.max_attempts.max(1);
        let mut retries = max_attempts;

        loop {
            match self.open_session().await {
                Ok(session) => {
                    self.session = Some(session);
                    info!("RCON connection successfully established.");
                    return Ok(());
                }
                Err(e) => {
                    error!("Failed to establish RCON connection: {}", e);
                    retries -= 1;
                    if retries > 0 {
                        info!("Retrying to connect... attempts remaining: {}", retries);
                        sleep(self.policy.delay).await;
                    } else {
                        error!("Max retries reached. Unable to establish RCON connection.");
                        return Err(RconError::ConnectionExhausted {
                            attempts: max_attempts,
                            last_error: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    async fn open_session(&self) -> Result<Box<dyn RconSession>, RconError> {
        debug!("Connecting to RCON at {}", self.connector.address());
        let mut session = self.connector.connect().await?;
        session.command(PROBE_COMMAND).await?;
        Ok(session)
    }

    /// Send an in-game broadcast. `Ok(None)` means it failed and was logged.
    pub async fn broadcast(&mut self, message: &str) -> Result<Option<String>, RconError> {
        self.execute(&format!("broadcast {}", message), "broadcast message")
            .await
    }

    /// Run an arbitrary console command. `Ok(None)` means it failed and was logged.
    pub async fn command(&mut self, command: &str) -> Result<Option<String>, RconError> {
        self.execute(command, "execute command").await
    }

    async fn execute(
        &mut self,
        command: &str,
        action: &str,
    ) -> Result<Option<String>, RconError> {
        self.ensure_connected().await?;

        let result = match self.session.as_mut() {
            Some(session) => session.command(command).await,
            None => Err(RconError::NotRunning {
                container: self.container.name().to_string(),
            }),
        };

        match result {
            Ok(response) => {
                info!("{}", response.trim());
                Ok(Some(response))
            }
            Err(e) => {
                error!("Failed to {}: {}", action, e);
                Ok(None)
            }
        }
    }

    pub fn disconnect(&mut self) {
        if self.session.take().is_some() {
            debug!("RCON session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConnector, FakeContainer};
    use tracing_test::traced_test;

    fn client(connector: &Arc<FakeConnector>, container: &Arc<FakeContainer>) -> RconClient {
        RconClient::new(connector.clone(), container.clone(), RetryPolicy::default())
    }

    #[traced_test]
    #[tokio::test]
    async fn not_running_container_skips_connection() {
        let connector = Arc::new(FakeConnector::new());
        let container = Arc::new(FakeContainer::stopped("palworld"));
        let mut client = client(&connector, &container);

        let status = client.ensure_connected().await.unwrap();

        assert_eq!(status, ConnectionStatus::ContainerNotRunning);
        assert_eq!(connector.attempts(), 0);
        logs_assert(|lines: &[&str]| {
            let errors = lines.iter().filter(|line| line.contains("ERROR")).count();
            if errors == 1 {
                Ok(())
            } else {
                Err(format!("expected exactly one error line, got {}", errors))
            }
        });
        assert!(logs_contain("Container not running"));
    }

    #[traced_test]
    #[tokio::test]
    async fn command_on_stopped_container_is_logged_not_raised() {
        let connector = Arc::new(FakeConnector::new());
        let container = Arc::new(FakeContainer::stopped("palworld"));
        let mut client = client(&connector, &container);

        let response = client.command("save").await.unwrap();

        assert!(response.is_none());
        assert!(logs_contain("Failed to execute command"));
    }

    #[tokio::test]
    async fn live_session_is_reused() {
        let connector = Arc::new(FakeConnector::new());
        let container = Arc::new(FakeContainer::running("palworld"));
        let mut client = client(&connector, &container);

        assert_eq!(
            client.ensure_connected().await.unwrap(),
            ConnectionStatus::Established
        );
        assert_eq!(
            client.ensure_connected().await.unwrap(),
            ConnectionStatus::Reused
        );
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn dead_session_is_replaced() {
        let connector = Arc::new(FakeConnector::new());
        let container = Arc::new(FakeContainer::running("palworld"));
        let mut client = client(&connector, &container);

        client.ensure_connected().await.unwrap();
        connector.break_sessions();

        assert_eq!(
            client.ensure_connected().await.unwrap(),
            ConnectionStatus::Established
        );
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let connector = Arc::new(FakeConnector::failing_first(2));
        let container = Arc::new(FakeContainer::running("palworld"));
        let mut client = client(&connector, &container);

        let started = tokio::time::Instant::now();
        client.connect().await.unwrap();

        assert_eq!(connector.attempts(), 3);
        assert_eq!(started.elapsed(), RETRY_DELAY * 2);
        assert!(client.has_session());
    }

    #[tokio::test]
    async fn broadcast_prefixes_command() {
        let connector = Arc::new(FakeConnector::new());
        let container = Arc::new(FakeContainer::running("palworld"));
        let mut client = client(&connector, &container);

        client.broadcast("hello").await.unwrap();

        assert!(connector
            .commands()
            .contains(&"broadcast hello".to_string()));
    }
}
