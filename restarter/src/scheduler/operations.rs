use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info, instrument, warn};

use super::{IntervalJob, JobKind, ManagerCell};
use crate::constants::scheduler::TICK;
use crate::restart::ReadinessOutcome;

pub struct RestartScheduler {
    manager: Arc<ManagerCell>,
    jobs: Vec<IntervalJob>,
    tick: Duration,
}

impl RestartScheduler {
    pub fn new(manager: Arc<ManagerCell>, restart_every: Duration, notify_every: Duration) -> Self {
        let now = Instant::now();
        Self {
            manager,
            jobs: vec![
                IntervalJob::new(JobKind::Restart, restart_every, now),
                IntervalJob::new(JobKind::NotifyRestart, notify_every, now),
            ],
            tick: TICK,
        }
    }

    pub fn next_run(&self, kind: JobKind) -> Option<Instant> {
        self.jobs
            .iter()
            .find(|job| job.kind == kind)
            .map(|job| job.next_run)
    }

    /// Poll until `shutdown` resolves. A running job is never interrupted.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Schedules started: restart every {}m, notify every {}m",
            self.period(JobKind::Restart).as_secs() / 60,
            self.period(JobKind::NotifyRestart).as_secs() / 60
        );

        tokio::pin!(shutdown);
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_pending().await;
                }
            }
        }
    }

    /// Run every job that is due right now, earliest first. Returns how many ran.
    pub async fn run_pending(&mut self) -> usize {
        let now = Instant::now();
        let mut due: Vec<usize> = (0..self.jobs.len())
            .filter(|&i| self.jobs[i].is_due(now))
            .collect();
        due.sort_by_key(|&i| self.jobs[i].next_run);

        for &index in &due {
            let kind = self.jobs[index].kind;
            if let Err(e) = self.run_job(kind).await {
                error!("Scheduled {} failed: {:#}", kind, e);
            }
            self.jobs[index].reschedule(Instant::now());
        }

        due.len()
    }

    #[instrument(skip(self))]
    async fn run_job(&self, kind: JobKind) -> Result<()> {
        let mut manager = self.manager.get().await?;

        match kind {
            JobKind::Restart => {
                let report = manager.restart().await?;
                match report.readiness {
                    Ok(ReadinessOutcome::Ready { .. }) => info!(
                        "Restart completed, next restart at {}",
                        report.next_restart_at.to_rfc3339()
                    ),
                    _ => warn!(
                        "Restart finished without confirmed readiness, next restart at {}",
                        report.next_restart_at.to_rfc3339()
                    ),
                }
            }
            JobKind::NotifyRestart => {
                let remaining = manager.notify_restart().await?;
                info!("Announced restart in {}", remaining);
            }
        }

        Ok(())
    }

    fn period(&self, kind: JobKind) -> Duration {
        self.jobs
            .iter()
            .find(|job| job.kind == kind)
            .map(|job| job.period)
            .unwrap_or_default()
    }
}
