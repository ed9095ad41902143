//! Crash bookkeeping for the restart policy.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Number of crashes remembered
pub const DEFAULT_CAPACITY: usize = 5;

/// Crashes closer together than this stop the restarts
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(3 * 60);

/// What to do after a crash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Start the server again
    Restart,
    /// Too many crashes too fast; stop for good
    Refuse {
        /// Crashes inside the window, this one included
        crashes: usize,
        /// Time between the oldest remembered crash and this one
        span: Duration,
    },
}

/// The most recent crash timestamps of one server session.
///
/// While fewer than `capacity` crashes are remembered every crash is
/// recorded and restarted. Once full, a crash within `window` of the oldest
/// remembered one is refused; a later one evicts the oldest and restarts.
#[derive(Debug, Clone)]
pub struct RestartLedger {
    crashes: VecDeque<DateTime<Utc>>,
    capacity: usize,
    window: Duration,
}

impl RestartLedger {
    /// Ledger with the default policy: 5 crashes, 3 minutes
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(DEFAULT_CAPACITY, DEFAULT_WINDOW)
    }

    /// Ledger with a custom policy; `capacity` is at least 1
    #[must_use]
    pub fn with_policy(capacity: usize, window: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            crashes: VecDeque::with_capacity(capacity),
            capacity,
            window,
        }
    }

    /// Record a crash at `at` and decide whether to restart
    pub fn record_crash(&mut self, at: DateTime<Utc>) -> RestartDecision {
        if self.crashes.len() < self.capacity {
            self.crashes.push_back(at);
            return RestartDecision::Restart;
        }

        // Measured from the oldest remembered crash to this one, so a burst of
        // five followed by a crash more than `window` after the burst's start
        // still restarts.
        let oldest = self.crashes.front().copied().unwrap_or(at);
        let span = (at - oldest).to_std().unwrap_or(Duration::ZERO);
        if span <= self.window {
            return RestartDecision::Refuse {
                crashes: self.crashes.len() + 1,
                span,
            };
        }

        self.crashes.pop_front();
        self.crashes.push_back(at);
        RestartDecision::Restart
    }

    /// Forget every crash
    pub fn clear(&mut self) {
        self.crashes.clear();
    }

    /// Number of remembered crashes
    #[must_use]
    pub fn len(&self) -> usize {
        self.crashes.len()
    }

    /// Returns true if no crash is remembered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.crashes.is_empty()
    }

    /// Width of the refusal window
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

impl Default for RestartLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn first_five_crashes_restart() {
        let mut ledger = RestartLedger::new();
        for i in 0..5 {
            assert_eq!(ledger.record_crash(at(i)), RestartDecision::Restart);
        }
        assert_eq!(ledger.len(), 5);
    }

    #[test]
    fn sixth_crash_inside_window_is_refused() {
        let mut ledger = RestartLedger::new();
        for i in 0..5 {
            ledger.record_crash(at(i * 30));
        }
        assert_eq!(
            ledger.record_crash(at(170)),
            RestartDecision::Refuse {
                crashes: 6,
                span: Duration::from_secs(170),
            }
        );
        assert_eq!(ledger.len(), 5);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let mut ledger = RestartLedger::new();
        for i in 0..5 {
            ledger.record_crash(at(i));
        }
        assert!(matches!(ledger.record_crash(at(180)), RestartDecision::Refuse { .. }));
    }

    #[test]
    fn late_crash_after_fast_burst_restarts() {
        let mut ledger = RestartLedger::new();
        for i in 0..5 {
            ledger.record_crash(at(i * 10));
        }
        assert_eq!(ledger.record_crash(at(181)), RestartDecision::Restart);
        // the burst's second crash, at 10s, is now the oldest
        assert!(matches!(ledger.record_crash(at(185)), RestartDecision::Refuse { .. }));
    }

    #[test]
    fn slow_crashes_slide_the_window() {
        let mut ledger = RestartLedger::new();
        for i in 0..5 {
            ledger.record_crash(at(i * 60));
        }
        assert_eq!(ledger.record_crash(at(300)), RestartDecision::Restart);
        assert_eq!(ledger.len(), 5);
        // oldest is now at 60s
        assert!(matches!(ledger.record_crash(at(240)), RestartDecision::Refuse { .. }));
    }

    #[test]
    fn clear_resets_the_count() {
        let mut ledger = RestartLedger::new();
        for i in 0..5 {
            ledger.record_crash(at(i));
        }
        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.record_crash(at(6)), RestartDecision::Restart);
    }
}
