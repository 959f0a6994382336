//! Performance metrics
//!
//! Pure aggregations over a reconciled session set. Everything here can be
//! recomputed from the same inputs at any time; nothing accumulates between
//! calls.
//!
//! - `dashboard`: mode-filtered accuracy, rolling window, rankings
//! - `roster`: per-dog and per-trainer all-time summaries and module history

mod dashboard;
mod roster;

pub use dashboard::*;
pub use roster::*;

use serde::{Deserialize, Serialize};

use crate::types::SessionRecord;

/// Success/failure tally over a set of sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub successes: u32,
    pub failures: u32,
}

impl Tally {
    /// Add one session's opportunities.
    ///
    /// Uses the derived counters, which already encode the mode rules:
    /// learning units for training, one classified outcome per operational
    /// sample. Saturates at `u32::MAX`.
    pub fn add(&mut self, session: &SessionRecord) {
        self.successes = self.successes.saturating_add(session.counters.hits);
        self.failures = self.failures.saturating_add(session.counters.misses);
    }

    pub fn over<'a>(sessions: impl IntoIterator<Item = &'a SessionRecord>) -> Self {
        let mut tally = Tally::default();
        for session in sessions {
            tally.add(session);
        }
        tally
    }

    pub fn opportunities(&self) -> u32 {
        self.successes.saturating_add(self.failures)
    }

    /// Success percentage, 0 when there were no opportunities
    pub fn accuracy(&self) -> f64 {
        accuracy(self.successes, self.opportunities())
    }
}

/// Sum of counter values, saturating at `u32::MAX`
pub fn saturating_sum(values: impl IntoIterator<Item = u32>) -> u32 {
    values.into_iter().fold(0, u32::saturating_add)
}

/// `successes / total * 100`, defined as 0 when `total` is 0
pub fn accuracy(successes: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        (successes as f64 / total as f64) * 100.0
    }
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
