//! Fixed-interval scheduling for the restart cycle
//!
//! This module drives two periodic jobs:
//! - Restart (default every 2 hours)
//! - "Restart in ..." broadcast (default every 20 minutes)
//!
//! # Execution model
//!
//! - **Single foreground loop**: polls once per second
//! - **Sequential**: due jobs run one after another, to completion, before the next poll
//! - **Drift-free relative to completion**: a job's next run is one period after it finished
//! - **Isolated failures**: a failed job is logged and the loop keeps going

pub mod cell;
pub mod operations;

pub use cell::{ManagerCell, ManagerFactory};
pub use operations::RestartScheduler;

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Restart,
    NotifyRestart,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Restart => write!(f, "restart"),
            JobKind::NotifyRestart => write!(f, "restart notification"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntervalJob {
    pub kind: JobKind,
    pub period: Duration,
    pub next_run: Instant,
}

impl IntervalJob {
    pub fn new(kind: JobKind, period: Duration, now: Instant) -> Self {
        Self {
            kind,
            period,
            next_run: now + period,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_run
    }

    pub fn reschedule(&mut self, finished_at: Instant) {
        self.next_run = finished_at + self.period;
    }
}
