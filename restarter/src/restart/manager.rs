use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use super::readiness::{wait_for_ready, ReadinessOutcome};
use super::timing::{countdown_message, TimeRemaining};
use crate::config::Config;
use crate::constants::{rcon::SAVE_COMMAND, restart};
use crate::container::ContainerHandle;
use crate::errors::{RconError, ReadinessError, RestarterError};
use crate::notify::{NotificationSink, Severity};
use crate::rcon::RconClient;

pub const RESTARTING_NOTIFICATION: &str = "Server restarting...";
pub const RESTARTED_NOTIFICATION: &str = "Server restarted!";

#[derive(Debug, Clone)]
pub struct RestartSettings {
    pub restart_interval: Duration,
    pub countdown_from: u32,
    pub countdown_step: Duration,
    pub countdown_grace: Duration,
    pub sentinel: Vec<u8>,
    /// `None` waits for the sentinel forever
    pub readiness_timeout: Option<Duration>,
}

impl Default for RestartSettings {
    fn default() -> Self {
        Self {
            restart_interval: Duration::from_secs(restart::DEFAULT_RESTART_INTERVAL_HOURS * 3600),
            countdown_from: restart::COUNTDOWN_FROM,
            countdown_step: restart::COUNTDOWN_STEP,
            countdown_grace: restart::COUNTDOWN_GRACE,
            sentinel: restart::READINESS_SENTINEL.to_vec(),
            readiness_timeout: Some(Duration::from_secs(
                restart::DEFAULT_READINESS_TIMEOUT_SECONDS,
            )),
        }
    }
}

impl RestartSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            restart_interval: config.restart_interval(),
            readiness_timeout: config.readiness_timeout(),
            ..Self::default()
        }
    }
}

/// Where the restart cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPhase {
    Scheduled,
    CountingDown,
    Saving,
    Restarting,
    AwaitingReady,
}

#[derive(Debug)]
pub struct RestartReport {
    pub readiness: Result<ReadinessOutcome, ReadinessError>,
    pub completed_at: DateTime<Utc>,
    pub next_restart_at: DateTime<Utc>,
}

/// Drives the restart cycle for one server.
///
/// There is exactly one per process. It is owned by the scheduler and only
/// ever borrowed mutably, so a restart and a notification can never overlap.
pub struct RestartManager {
    settings: RestartSettings,
    rcon: RconClient,
    container: Arc<dyn ContainerHandle>,
    notifier: Arc<dyn NotificationSink>,
    next_restart_at: DateTime<Utc>,
    phase: RestartPhase,
}

impl RestartManager {
    pub fn new(
        settings: RestartSettings,
        rcon: RconClient,
        container: Arc<dyn ContainerHandle>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let mut manager = Self {
            settings,
            rcon,
            container,
            notifier,
            next_restart_at: Utc::now(),
            phase: RestartPhase::Scheduled,
        };
        manager.schedule_next(Utc::now());
        manager
    }

    pub fn next_restart_at(&self) -> DateTime<Utc> {
        self.next_restart_at
    }

    pub fn phase(&self) -> RestartPhase {
        self.phase
    }

    pub fn rcon(&mut self) -> &mut RconClient {
        &mut self.rcon
    }

    /// Always computed from the current clock.
    pub fn time_remaining(&self) -> TimeRemaining {
        TimeRemaining::until(self.next_restart_at, Utc::now())
    }

    /// Broadcast how long until the next restart. Does not touch the schedule.
    #[instrument(skip(self), fields(container = %self.container.name()))]
    pub async fn notify_restart(&mut self) -> Result<TimeRemaining, RconError> {
        let remaining = self.time_remaining();
        debug!("Next restart in {}", remaining);
        self.rcon.broadcast(&remaining.announcement()).await?;
        Ok(remaining)
    }

    /// Warn players, save, restart the container, wait for the server to come
    /// back and schedule the next restart.
    ///
    /// Broadcast and save failures are logged and skipped. Exhausting the RCON
    /// retry budget or a rejected container restart aborts the sequence.
    #[instrument(skip(self), fields(container = %self.container.name()))]
    pub async fn restart(&mut self) -> Result<RestartReport, RestarterError> {
        let result = self.run_restart().await;
        self.enter(RestartPhase::Scheduled);
        if let Err(e) = &result {
            error!("Restart sequence aborted: {}", e);
        }
        result
    }

    async fn run_restart(&mut self) -> Result<RestartReport, RestarterError> {
        self.enter(RestartPhase::CountingDown);
        self.countdown().await?;

        self.enter(RestartPhase::Saving);
        self.rcon.command(SAVE_COMMAND).await?;

        self.notifier
            .notify(RESTARTING_NOTIFICATION, Severity::Info)
            .await;

        self.enter(RestartPhase::Restarting);
        let restarted_at = Utc::now();
        if let Err(e) = self.container.restart().await {
            self.notifier
                .notify(&format!("Server restart failed: {}", e), Severity::Critical)
                .await;
            return Err(e.into());
        }

        self.enter(RestartPhase::AwaitingReady);
        let lines = self.container.stream_log_lines(restarted_at);
        let readiness =
            wait_for_ready(lines, &self.settings.sentinel, self.settings.readiness_timeout).await;

        let completed_at = Utc::now();
        self.schedule_next(completed_at);

        match &readiness {
            Ok(ReadinessOutcome::Ready { lines }) => {
                debug!("Readiness line found after {} lines", lines);
                self.notifier
                    .notify(RESTARTED_NOTIFICATION, Severity::Info)
                    .await;
                info!("{}", RESTARTED_NOTIFICATION);
            }
            Ok(ReadinessOutcome::StreamClosed { lines }) => {
                warn!(
                    "Log stream closed after {} lines without the readiness line",
                    lines
                );
                self.notifier
                    .notify(RESTARTED_NOTIFICATION, Severity::Info)
                    .await;
                info!("{}", RESTARTED_NOTIFICATION);
            }
            Err(e) => {
                error!("{}", e);
                self.notifier
                    .notify(
                        &format!("Server restart did not report ready: {}", e),
                        Severity::Error,
                    )
                    .await;
            }
        }

        Ok(RestartReport {
            readiness,
            completed_at,
            next_restart_at: self.next_restart_at,
        })
    }

    /// 5..1, then NOW, pausing after each; then a short grace period.
    async fn countdown(&mut self) -> Result<(), RconError> {
        for count in (1..=self.settings.countdown_from).rev() {
            self.rcon.broadcast(&countdown_message(count)).await?;
            sleep(self.settings.countdown_step).await;
        }
        self.rcon
            .broadcast(restart::RESTARTING_NOW_MESSAGE)
            .await?;
        sleep(self.settings.countdown_step).await;
        sleep(self.settings.countdown_grace).await;
        Ok(())
    }

    fn schedule_next(&mut self, from: DateTime<Utc>) {
        self.next_restart_at = chrono::Duration::from_std(self.settings.restart_interval)
            .ok()
            .and_then(|interval| from.checked_add_signed(interval))
            .unwrap_or_else(|| {
                warn!(
                    "Restart interval of {}s is out of range, no further restart scheduled",
                    self.settings.restart_interval.as_secs()
                );
                DateTime::<Utc>::MAX_UTC
            });
        debug!(
            "Next restart scheduled for {}",
            self.next_restart_at.to_rfc3339()
        );
    }

    fn enter(&mut self, phase: RestartPhase) {
        if self.phase != phase {
            debug!("Restart phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}
