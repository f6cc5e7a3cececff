//! The restart cycle
//!
//! `Scheduled -> CountingDown -> Saving -> Restarting -> AwaitingReady -> Scheduled`,
//! with `notify_restart` as a side trip that never leaves `Scheduled`.

pub mod manager;
pub mod readiness;
pub mod timing;

pub use manager::{RestartManager, RestartPhase, RestartReport, RestartSettings};
pub use readiness::{wait_for_ready, ReadinessOutcome};
pub use timing::TimeRemaining;
