//! Restart manager wired to fakes that share one event timeline

use restarter::rcon::{RconClient, RetryPolicy};
use restarter::restart::{RestartManager, RestartSettings};
use restarter::testing::{EventLog, FakeConnector, FakeContainer, RecordingSink};
use std::sync::Arc;
use std::time::Duration;

pub const CONTAINER_NAME: &str = "palworld";

pub const SENTINEL_LINE: &str = "[S_API FAIL] Tried to access Steam interface SteamNetworkingUtils004 before SteamAPI_Init succeeded.";

pub struct Harness {
    pub events: EventLog,
    pub connector: Arc<FakeConnector>,
    pub container: Arc<FakeContainer>,
    pub sink: Arc<RecordingSink>,
    pub manager: RestartManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(RestartSettings::default(), RetryPolicy::default())
    }

    pub fn with_settings(settings: RestartSettings, policy: RetryPolicy) -> Self {
        let events = EventLog::new();
        let connector = Arc::new(FakeConnector::with_events(events.clone()));
        let container = Arc::new(FakeContainer::with_events(CONTAINER_NAME, events.clone()));
        let sink = Arc::new(RecordingSink::with_events(events.clone()));

        let rcon = RconClient::new(connector.clone(), container.clone(), policy);
        let manager = RestartManager::new(settings, rcon, container.clone(), sink.clone());

        Self {
            events,
            connector,
            container,
            sink,
            manager,
        }
    }

    /// Boot output the fake container replays after every restart.
    pub fn with_boot_log(self, noise_lines: usize, hang: bool) -> Self {
        self.container.script_logs(boot_log(noise_lines), hang);
        self
    }
}

/// `noise_lines` unrelated lines followed by the readiness line.
pub fn boot_log(noise_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = (0..noise_lines)
        .map(|i| format!("[2024.01.01-00:00:{:02}] Loading world chunk {}", i % 60, i))
        .collect();
    lines.push(format!("[2024.01.01-00:01:00] {}", SENTINEL_LINE));
    lines
}

/// Retry policy small enough to exhaust quickly in tests that do not pause time.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        delay: Duration::from_millis(1),
    }
}
