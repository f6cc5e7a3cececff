//! Time-until-restart math and the broadcast strings built from it

use chrono::{DateTime, Utc};
use std::fmt;

/// `next_restart_at - now` split into whole hours, minutes and seconds.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeRemaining {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeRemaining {
    /// Past targets clamp to zero.
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::from_seconds((target - now).num_seconds())
    }

    pub fn from_seconds(total_seconds: i64) -> Self {
        let total_seconds = total_seconds.max(0);
        let hours = total_seconds / 3600;
        let remainder = total_seconds % 3600;
        Self {
            hours,
            minutes: remainder / 60,
            seconds: remainder % 60,
        }
    }

    pub fn total_seconds(&self) -> i64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }

    pub fn hour_unit(&self) -> &'static str {
        if self.hours == 1 {
            "hr"
        } else {
            "hrs"
        }
    }

    pub fn minute_unit(&self) -> &'static str {
        if self.minutes == 1 {
            "min"
        } else {
            "mins"
        }
    }

    /// In-game broadcast, e.g. `server_restart_in_1hr_40mins`.
    ///
    /// The console treats spaces as argument separators, hence the underscores.
    pub fn announcement(&self) -> String {
        format!(
            "server_restart_in_{}{}_{}{}",
            self.hours,
            self.hour_unit(),
            self.minutes,
            self.minute_unit()
        )
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
    }
}

pub fn countdown_message(count: u32) -> String {
    format!("server_restarting_in_{}_secs", count)
}
