//! Timing, retry and protocol constants for the restart cycle
//!
//! Organized by concern so the values that drive observable timing live in one
//! place. Changing anything in `restart` or `rcon` changes what players see and
//! how long a restart takes.

use std::time::Duration;

/// Restart cycle timing
pub mod restart {
    use super::Duration;

    /// Default interval between scheduled restarts (hours)
    pub const DEFAULT_RESTART_INTERVAL_HOURS: u64 = 2;

    /// Default interval between "restart in ..." broadcasts (minutes)
    pub const DEFAULT_NOTIFY_INTERVAL_MINUTES: u64 = 20;

    /// Longest accepted restart interval (one year)
    pub const MAX_RESTART_INTERVAL_HOURS: u64 = 24 * 365;

    /// First value of the countdown; counts down to 1 before the NOW message
    pub const COUNTDOWN_FROM: u32 = 5;

    /// Pause after every countdown broadcast, including the NOW message
    pub const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

    /// Extra pause after the countdown before saving the world
    pub const COUNTDOWN_GRACE: Duration = Duration::from_secs(2);

    /// Final countdown broadcast
    pub const RESTARTING_NOW_MESSAGE: &str = "server_restarting_NOW!";

    /// Line printed by the server once its boot sequence has finished
    pub const READINESS_SENTINEL: &[u8] = b"[S_API FAIL] Tried to access Steam interface SteamNetworkingUtils004 before SteamAPI_Init succeeded.";

    /// Default upper bound on waiting for the sentinel (seconds, 0 = unbounded)
    pub const DEFAULT_READINESS_TIMEOUT_SECONDS: u64 = 900;
}

/// RCON connection policy
pub mod rcon {
    use super::Duration;

    /// Connection attempts before giving up
    pub const MAX_RETRIES: u32 = 100;

    /// Fixed delay between connection attempts
    pub const RETRY_DELAY: Duration = Duration::from_secs(3);

    /// Command used as a liveness probe
    pub const PROBE_COMMAND: &str = "info";

    /// Command that persists the world
    pub const SAVE_COMMAND: &str = "save";

    /// Default RCON port
    pub const DEFAULT_PORT: u16 = 25575;

    /// TCP connect timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Read/write timeout for a single command round trip
    pub const IO_TIMEOUT: Duration = Duration::from_secs(10);

    /// Largest body a server may send in a single packet
    pub const MAX_BODY_SIZE: usize = 4096;
}

/// Scheduler loop
pub mod scheduler {
    use super::Duration;

    /// Poll interval of the foreground loop
    pub const TICK: Duration = Duration::from_secs(1);
}

/// Notification delivery
pub mod notify {
    /// Webhook request timeout
    pub const WEBHOOK_TIMEOUT_SECONDS: u64 = 10;

    /// Default username shown on webhook messages
    pub const DEFAULT_USERNAME: &str = "restarter";
}
