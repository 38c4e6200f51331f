//! Rest countdown between sets.
//!
//! Wall-clock based: the timer stores its deadline, so it keeps counting
//! while the user is idle and survives being serialized with the session.
//! Expiry only reports zero remaining; advancing to the next set is up to
//! the caller.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RestTimer {
    total_seconds: u32,
    ends_at: Option<DateTime<Utc>>,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a countdown of `seconds`
    pub fn start(&mut self, seconds: u32, now: DateTime<Utc>) {
        self.total_seconds = seconds;
        self.ends_at = if seconds == 0 {
            None
        } else {
            Some(now + Duration::seconds(seconds as i64))
        };
        tracing::debug!("Rest timer started for {}s", seconds);
    }

    /// Zero the remaining time immediately
    pub fn skip(&mut self) {
        self.ends_at = None;
    }

    /// Extend (or shorten, with a negative value) a running countdown.
    ///
    /// Remaining time never drops below zero; a timer that is not running is
    /// left alone.
    pub fn add_time(&mut self, seconds: i64, now: DateTime<Utc>) {
        if !self.is_running(now) {
            return;
        }
        let remaining = (self.time_remaining(now) as i64 + seconds).max(0);
        if seconds > 0 {
            self.total_seconds = self
                .total_seconds
                .saturating_add(u32::try_from(seconds).unwrap_or(u32::MAX));
        }
        self.ends_at = (remaining > 0).then(|| now + Duration::seconds(remaining));
    }

    /// Whole seconds left, rounded up
    pub fn time_remaining(&self, now: DateTime<Utc>) -> u32 {
        match self.ends_at {
            Some(end) if end > now => {
                let millis = (end - now).num_milliseconds();
                ((millis + 999) / 1000) as u32
            }
            _ => 0,
        }
    }

    /// Length of the current countdown including added time
    pub fn total_time(&self) -> u32 {
        self.total_seconds
    }

    /// Fraction of the countdown elapsed, 0.0 ..= 1.0
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        if self.total_seconds == 0 {
            return 1.0;
        }
        let remaining = self.time_remaining(now).min(self.total_seconds);
        1.0 - remaining as f64 / self.total_seconds as f64
    }

    /// Whether any rest remains at `now`
    pub fn is_running(&self, now: DateTime<Utc>) -> bool {
        self.time_remaining(now) > 0
    }
}
