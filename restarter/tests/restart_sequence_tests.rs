//! Integration tests for the full restart sequence
//!
//! Covers the countdown broadcast order and timing, the save/notify/restart
//! ordering, readiness detection against a scripted log stream, and the
//! failure modes that must (and must not) abort a restart.

mod common;

use common::fixtures::*;
use restarter::constants::restart::{COUNTDOWN_GRACE, COUNTDOWN_STEP};
use restarter::errors::{RconError, ReadinessError, RestarterError};
use restarter::notify::Severity;
use restarter::rcon::RetryPolicy;
use restarter::restart::{ReadinessOutcome, RestartPhase, RestartSettings};
use std::time::Duration;
use tokio::time::Instant;

const EXPECTED_COUNTDOWN: [&str; 6] = [
    "server_restarting_in_5_secs",
    "server_restarting_in_4_secs",
    "server_restarting_in_3_secs",
    "server_restarting_in_2_secs",
    "server_restarting_in_1_secs",
    "server_restarting_NOW!",
];

#[tokio::test(start_paused = true)]
async fn test_countdown_broadcasts_in_order() {
    let mut h = Harness::new().with_boot_log(3, false);

    h.manager.restart().await.expect("restart should succeed");

    assert_eq!(h.connector.broadcasts(), EXPECTED_COUNTDOWN);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_survives_broadcast_failures() {
    let mut h = Harness::new().with_boot_log(3, false);
    h.connector
        .fail_command("broadcast server_restarting_in_3_secs");
    h.connector.fail_command("broadcast server_restarting_NOW!");

    let report = h.manager.restart().await.expect("restart should succeed");

    assert_eq!(h.connector.broadcasts(), EXPECTED_COUNTDOWN);
    assert_eq!(h.container.restarts(), 1);
    assert!(report.readiness.unwrap().is_ready());
}

#[tokio::test(start_paused = true)]
async fn test_countdown_duration() {
    let mut h = Harness::new().with_boot_log(0, false);

    let started = Instant::now();
    h.manager.restart().await.expect("restart should succeed");

    // One pause after each of the six broadcasts, then the grace period.
    assert_eq!(started.elapsed(), COUNTDOWN_STEP * 6 + COUNTDOWN_GRACE);
    assert_eq!(started.elapsed(), Duration::from_secs(8));
}

#[tokio::test(start_paused = true)]
async fn test_phases_run_in_order() {
    let mut h = Harness::new().with_boot_log(2, false);

    h.manager.restart().await.expect("restart should succeed");

    let mut expected: Vec<String> = EXPECTED_COUNTDOWN
        .iter()
        .map(|message| format!("rcon:broadcast {}", message))
        .collect();
    expected.extend(
        [
            "rcon:save",
            "notify:Server restarting...",
            "container:restart",
            "container:logs",
            "notify:Server restarted!",
        ]
        .map(String::from),
    );
    assert_eq!(h.events.snapshot(), expected);
    assert_eq!(h.manager.phase(), RestartPhase::Scheduled);
}

#[tokio::test(start_paused = true)]
async fn test_save_failure_does_not_abort() {
    let mut h = Harness::new().with_boot_log(1, false);
    h.connector.fail_command("save");

    h.manager.restart().await.expect("restart should succeed");

    assert_eq!(h.container.restarts(), 1);
    assert_eq!(
        h.sink.messages(),
        vec!["Server restarting...", "Server restarted!"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_readiness_consumes_exactly_up_to_sentinel() {
    let mut h = Harness::new();
    let mut lines = boot_log(10);
    lines.extend((0..5).map(|i| format!("after ready {}", i)));
    h.container.script_logs(lines, true);

    let report = h.manager.restart().await.expect("restart should succeed");

    assert_eq!(
        report.readiness.unwrap(),
        ReadinessOutcome::Ready { lines: 11 }
    );
    assert_eq!(h.container.lines_consumed(), 11);
}

#[tokio::test(start_paused = true)]
async fn test_logs_followed_from_restart_time() {
    let mut h = Harness::new().with_boot_log(1, false);

    let before = chrono::Utc::now();
    h.manager.restart().await.expect("restart should succeed");
    let after = chrono::Utc::now();

    let requests = h.container.log_requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0] >= before && requests[0] <= after);
}

#[tokio::test(start_paused = true)]
async fn test_next_restart_is_one_interval_after_completion() {
    let interval = Duration::from_secs(3 * 3600);
    let settings = RestartSettings {
        restart_interval: interval,
        ..RestartSettings::default()
    };
    let mut h = Harness::with_settings(settings, RetryPolicy::default()).with_boot_log(4, false);

    let before = chrono::Utc::now();
    let report = h.manager.restart().await.expect("restart should succeed");
    let after = chrono::Utc::now();

    let interval = chrono::Duration::seconds(interval.as_secs() as i64);
    assert_eq!(report.next_restart_at, report.completed_at + interval);
    assert_eq!(h.manager.next_restart_at(), report.next_restart_at);
    assert!(report.completed_at >= before && report.completed_at <= after);
    assert!(h.manager.next_restart_at() > chrono::Utc::now());
}

#[tokio::test(start_paused = true)]
async fn test_closed_stream_still_completes() {
    let mut h = Harness::new();
    h.container.script_logs(["booting", "still booting"], false);

    let report = h.manager.restart().await.expect("restart should succeed");

    assert_eq!(
        report.readiness.unwrap(),
        ReadinessOutcome::StreamClosed { lines: 2 }
    );
    assert_eq!(
        h.sink.messages(),
        vec!["Server restarting...", "Server restarted!"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_readiness_timeout_reschedules_and_reports_error() {
    let settings = RestartSettings {
        readiness_timeout: Some(Duration::from_secs(600)),
        ..RestartSettings::default()
    };
    let mut h = Harness::with_settings(settings, RetryPolicy::default());
    h.container.script_logs(["booting", "still booting"], true);
    let scheduled_before = h.manager.next_restart_at();

    let report = h.manager.restart().await.expect("restart should return");

    match report.readiness {
        Err(ReadinessError::TimedOut { waited, lines }) => {
            assert_eq!(waited, Duration::from_secs(600));
            assert_eq!(lines, 2);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(h.manager.next_restart_at() >= scheduled_before);

    let notifications = h.sink.notifications();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[1].1, Severity::Error);
    assert!(notifications[1].0.starts_with("Server restart did not report ready"));
}

#[tokio::test(start_paused = true)]
async fn test_without_timeout_readiness_waits_forever() {
    let settings = RestartSettings {
        readiness_timeout: None,
        ..RestartSettings::default()
    };
    let mut h = Harness::with_settings(settings, RetryPolicy::default());
    h.container.script_logs(["no sentinel here"], true);

    let outcome = tokio::time::timeout(Duration::from_secs(24 * 3600), h.manager.restart()).await;

    assert!(outcome.is_err(), "restart must still be waiting");
    assert_eq!(h.container.restarts(), 1);
    assert_eq!(h.container.lines_consumed(), 1);
    assert_eq!(h.sink.messages(), vec!["Server restarting..."]);
}

#[tokio::test(start_paused = true)]
async fn test_container_restart_failure_aborts() {
    let mut h = Harness::new().with_boot_log(1, false);
    h.container.set_restart_fails(true);
    let scheduled_before = h.manager.next_restart_at();

    let err = h.manager.restart().await.unwrap_err();

    assert!(matches!(err, RestarterError::Container(_)));
    assert_eq!(h.manager.next_restart_at(), scheduled_before);
    assert_eq!(h.manager.phase(), RestartPhase::Scheduled);

    let notifications = h.sink.notifications();
    assert_eq!(notifications.last().unwrap().1, Severity::Critical);
}

#[tokio::test(start_paused = true)]
async fn test_connection_exhaustion_aborts_before_restart() {
    let mut h = Harness::new().with_boot_log(1, false);
    h.connector.set_always_failing(true);

    let err = h.manager.restart().await.unwrap_err();

    match err {
        RestarterError::Rcon(e @ RconError::ConnectionExhausted { .. }) => assert!(e.is_fatal()),
        other => panic!("expected exhausted connection, got {:?}", other),
    }
    assert_eq!(h.connector.attempts(), 100);
    assert_eq!(h.container.restarts(), 0);
    assert!(h.sink.notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stopped_container_still_restarts() {
    let mut h = Harness::new().with_boot_log(1, false);
    h.container.set_running(false);

    h.manager.restart().await.expect("restart should succeed");

    assert_eq!(h.connector.attempts(), 0);
    assert!(h.connector.broadcasts().is_empty());
    assert_eq!(h.container.restarts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_between_restarts() {
    let mut h = Harness::new().with_boot_log(1, false);

    h.manager.restart().await.expect("first restart");
    h.connector.break_sessions();
    h.manager.restart().await.expect("second restart");

    assert_eq!(h.connector.attempts(), 2);
    assert_eq!(h.container.restarts(), 2);
    assert_eq!(h.connector.broadcasts().len(), EXPECTED_COUNTDOWN.len() * 2);
}
