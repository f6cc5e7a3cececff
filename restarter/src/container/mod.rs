//! Container runtime façade
//!
//! The restart cycle needs exactly three things from the runtime: whether the
//! server container is running, a restart, and a live view of its output.

pub mod docker;
pub mod lines;

pub use docker::DockerContainer;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::errors::ContainerError;

/// Live, unbounded stream of raw output lines. Ends only when the runtime closes it.
pub type LogLineStream = BoxStream<'static, Result<Vec<u8>, ContainerError>>;

#[async_trait]
pub trait ContainerHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Runtime failures are reported as "not running".
    async fn is_running(&self) -> bool;

    /// Returns once the runtime accepted the restart, not when the server is ready.
    async fn restart(&self) -> Result<(), ContainerError>;

    /// Follow output written at or after `since`.
    fn stream_log_lines(&self, since: DateTime<Utc>) -> LogLineStream;
}
