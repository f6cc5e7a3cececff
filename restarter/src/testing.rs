//! In-memory stand-ins for the console, the container runtime and the
//! notification sink.
//!
//! Provides:
//! - [`FakeConnector`]: scripted connection failures, records every command
//! - [`FakeContainer`]: running flag, scripted log output, restart counter
//! - [`RecordingSink`]: captures notifications
//! - [`EventLog`]: optional shared timeline so tests can assert cross-component ordering
//!
//! None of the fakes touch the wall clock, so they work under
//! `#[tokio::test(start_paused = true)]`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::container::{ContainerHandle, LogLineStream};
use crate::errors::{ContainerError, RconError};
use crate::notify::{NotificationSink, Severity};
use crate::rcon::{RconConnector, RconSession};

/// Shared, ordered record of what every fake was asked to do.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

struct ConnectorState {
    attempts: AtomicU32,
    fail_first: AtomicU32,
    always_fail: AtomicBool,
    generation: AtomicU64,
    commands: Mutex<Vec<String>>,
    failing_commands: Mutex<HashSet<String>>,
    events: EventLog,
}

/// Console connector whose sessions answer every command with `ack`.
pub struct FakeConnector {
    state: Arc<ConnectorState>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::with_events(EventLog::new())
    }

    pub fn with_events(events: EventLog) -> Self {
        Self {
            state: Arc::new(ConnectorState {
                attempts: AtomicU32::new(0),
                fail_first: AtomicU32::new(0),
                always_fail: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                commands: Mutex::new(Vec::new()),
                failing_commands: Mutex::new(HashSet::new()),
                events,
            }),
        }
    }

    /// The first `n` connection attempts are refused.
    pub fn failing_first(n: u32) -> Self {
        let connector = Self::new();
        connector.state.fail_first.store(n, Ordering::SeqCst);
        connector
    }

    /// Every connection attempt is refused.
    pub fn always_failing() -> Self {
        let connector = Self::new();
        connector.state.always_fail.store(true, Ordering::SeqCst);
        connector
    }

    pub fn set_always_failing(&self, failing: bool) {
        self.state.always_fail.store(failing, Ordering::SeqCst);
    }

    /// Make one exact command fail on every session.
    pub fn fail_command(&self, command: &str) {
        self.state
            .failing_commands
            .lock()
            .unwrap()
            .insert(command.to_string());
    }

    /// Invalidate every session handed out so far.
    pub fn break_sessions(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// Every command sent, probes included.
    pub fn commands(&self) -> Vec<String> {
        self.state.commands.lock().unwrap().clone()
    }

    /// Commands sent, without liveness probes.
    pub fn issued_commands(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|command| command != crate::constants::rcon::PROBE_COMMAND)
            .collect()
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter_map(|command| command.strip_prefix("broadcast ").map(str::to_string))
            .collect()
    }
}

impl Default for FakeConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RconConnector for FakeConnector {
    async fn connect(&self) -> Result<Box<dyn RconSession>, RconError> {
        let attempt = self.state.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.state.always_fail.load(Ordering::SeqCst)
            || attempt <= self.state.fail_first.load(Ordering::SeqCst)
        {
            return Err(RconError::Transport {
                reason: "connection refused".to_string(),
            });
        }

        Ok(Box::new(FakeSession {
            generation: self.state.generation.load(Ordering::SeqCst),
            state: self.state.clone(),
        }))
    }

    fn address(&self) -> String {
        "fake:25575".to_string()
    }
}

struct FakeSession {
    generation: u64,
    state: Arc<ConnectorState>,
}

#[async_trait]
impl RconSession for FakeSession {
    async fn command(&mut self, command: &str) -> Result<String, RconError> {
        if self.generation != self.state.generation.load(Ordering::SeqCst) {
            return Err(RconError::Transport {
                reason: "broken pipe".to_string(),
            });
        }

        self.state.commands.lock().unwrap().push(command.to_string());
        if command != crate::constants::rcon::PROBE_COMMAND {
            self.state.events.push(format!("rcon:{}", command));
        }

        if self.state.failing_commands.lock().unwrap().contains(command) {
            return Err(RconError::Transport {
                reason: format!("'{}' rejected", command),
            });
        }

        Ok(format!("ack {}", command))
    }
}

/// Container with a scripted log output.
pub struct FakeContainer {
    name: String,
    running: AtomicBool,
    restart_fails: AtomicBool,
    restarts: AtomicU32,
    log_lines: Mutex<Vec<Vec<u8>>>,
    hang_after_lines: AtomicBool,
    lines_consumed: Arc<AtomicUsize>,
    log_requests: Mutex<Vec<DateTime<Utc>>>,
    events: EventLog,
}

impl FakeContainer {
    pub fn running(name: &str) -> Self {
        Self::build(name, true, EventLog::new())
    }

    pub fn stopped(name: &str) -> Self {
        Self::build(name, false, EventLog::new())
    }

    pub fn with_events(name: &str, events: EventLog) -> Self {
        Self::build(name, true, events)
    }

    fn build(name: &str, running: bool, events: EventLog) -> Self {
        Self {
            name: name.to_string(),
            running: AtomicBool::new(running),
            restart_fails: AtomicBool::new(false),
            restarts: AtomicU32::new(0),
            log_lines: Mutex::new(Vec::new()),
            hang_after_lines: AtomicBool::new(false),
            lines_consumed: Arc::new(AtomicUsize::new(0)),
            log_requests: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Output emitted after each restart. With `hang` the stream stays open afterwards.
    pub fn script_logs<I, L>(&self, lines: I, hang: bool)
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        *self.log_lines.lock().unwrap() =
            lines.into_iter().map(|line| line.as_ref().to_vec()).collect();
        self.hang_after_lines.store(hang, Ordering::SeqCst);
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn set_restart_fails(&self, fails: bool) {
        self.restart_fails.store(fails, Ordering::SeqCst);
    }

    pub fn restarts(&self) -> u32 {
        self.restarts.load(Ordering::SeqCst)
    }

    /// Lines pulled out of log streams so far.
    pub fn lines_consumed(&self) -> usize {
        self.lines_consumed.load(Ordering::SeqCst)
    }

    pub fn log_requests(&self) -> Vec<DateTime<Utc>> {
        self.log_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerHandle for FakeContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn restart(&self) -> Result<(), ContainerError> {
        if self.restart_fails.load(Ordering::SeqCst) {
            return Err(ContainerError::RestartFailed {
                name: self.name.clone(),
                reason: "daemon refused".to_string(),
            });
        }
        self.restarts.fetch_add(1, Ordering::SeqCst);
        self.events.push("container:restart");
        Ok(())
    }

    fn stream_log_lines(&self, since: DateTime<Utc>) -> LogLineStream {
        self.log_requests.lock().unwrap().push(since);
        self.events.push("container:logs");

        let lines = self.log_lines.lock().unwrap().clone();
        let consumed = self.lines_consumed.clone();
        let scripted = stream::iter(lines).map(move |line| {
            consumed.fetch_add(1, Ordering::SeqCst);
            Ok(line)
        });

        if self.hang_after_lines.load(Ordering::SeqCst) {
            scripted.chain(stream::pending()).boxed()
        } else {
            scripted.boxed()
        }
    }
}

/// Sink that keeps every notification.
#[derive(Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<(String, Severity)>>,
    events: EventLog,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: EventLog) -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn notifications(&self) -> Vec<(String, Severity)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|(message, _)| message)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, message: &str, severity: Severity) {
        self.events.push(format!("notify:{}", message));
        self.notifications
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}
