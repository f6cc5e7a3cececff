//! Detecting that a freshly restarted server has finished booting

use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::errors::{ContainerError, ReadinessError};

/// Target for forwarded server output.
pub const SERVER_LOG_TARGET: &str = "server_log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    /// The sentinel was seen on the `lines`-th line.
    Ready { lines: usize },
    /// The stream ended before the sentinel appeared.
    StreamClosed { lines: usize },
}

impl ReadinessOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessOutcome::Ready { .. })
    }
}

pub fn contains_sentinel(line: &[u8], sentinel: &[u8]) -> bool {
    if sentinel.is_empty() {
        return true;
    }
    line.windows(sentinel.len()).any(|window| window == sentinel)
}

/// Forward lines to the log until one contains `sentinel`.
///
/// With `limit = None` this waits as long as the stream stays open.
pub async fn wait_for_ready<S>(
    lines: S,
    sentinel: &[u8],
    limit: Option<Duration>,
) -> Result<ReadinessOutcome, ReadinessError>
where
    S: Stream<Item = Result<Vec<u8>, ContainerError>> + Unpin,
{
    let mut consumed = 0usize;
    let scan = scan_for_sentinel(lines, sentinel, &mut consumed);

    match limit {
        None => Ok(scan.await),
        Some(limit) => {
            let result = timeout(limit, scan).await;
            result.map_err(|_| ReadinessError::TimedOut {
                waited: limit,
                lines: consumed,
            })
        }
    }
}

async fn scan_for_sentinel<S>(
    mut lines: S,
    sentinel: &[u8],
    consumed: &mut usize,
) -> ReadinessOutcome
where
    S: Stream<Item = Result<Vec<u8>, ContainerError>> + Unpin,
{
    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Error while reading server output: {}", e);
                continue;
            }
        };

        *consumed += 1;
        info!(target: SERVER_LOG_TARGET, "{}", String::from_utf8_lossy(&line).trim());

        if contains_sentinel(&line, sentinel) {
            return ReadinessOutcome::Ready { lines: *consumed };
        }
    }

    ReadinessOutcome::StreamClosed { lines: *consumed }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_sentinel_inside_longer_line() {
        let line = b"[2024.03.01-12:00:00] [S_API FAIL] Tried to access Steam interface SteamNetworkingUtils004 before SteamAPI_Init succeeded.\r";
        assert!(contains_sentinel(
            line,
            crate::constants::restart::READINESS_SENTINEL
        ));
        assert!(!contains_sentinel(
            b"[S_API FAIL] SteamAPI_Init() failed",
            crate::constants::restart::READINESS_SENTINEL
        ));
    }

    #[test]
    fn sentinel_longer_than_line_never_matches() {
        assert!(!contains_sentinel(b"ok", b"okay"));
    }
}
