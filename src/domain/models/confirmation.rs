//! Per-strategy confirmation tracking.
//!
//! A strategy earns trust through repetition: three consecutive successes
//! confirm it, three consecutive failures blacklist it. The two streaks are
//! mutually exclusive -- recording one outcome always zeroes the opposite
//! counter, so a strategy can never be confirmed and skip-flagged at once.
//!
//! The tracker is internally synchronized so it may be shared across
//! concurrently running targets for cross-target learning; the
//! increment-and-reset pair is applied atomically under one lock.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Consecutive successes required to confirm a strategy.
pub const CONFIRMATION_THRESHOLD: u32 = 3;

/// Consecutive failures required to blacklist a strategy.
pub const BLACKLIST_THRESHOLD: u32 = 3;

// ---------------------------------------------------------------------------
// ConfirmationRecord
// ---------------------------------------------------------------------------

/// Rolling outcome state for one strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRecord {
    /// Current success streak. Zeroed by any failure.
    pub consecutive_successes: u32,
    /// Current failure streak. Zeroed by any success.
    pub consecutive_failures: u32,
    /// Latched true once the success streak reaches the threshold.
    pub confirmed: bool,
}

impl ConfirmationRecord {
    /// Whether this record currently blacklists its strategy.
    ///
    /// A strategy is skipped only after repeated failure without an
    /// intervening confirmation-level success streak.
    pub fn should_skip(&self, blacklist_threshold: u32, confirm_threshold: u32) -> bool {
        self.consecutive_failures >= blacklist_threshold
            && self.consecutive_successes < confirm_threshold
    }
}

// ---------------------------------------------------------------------------
// ConfirmationTracker
// ---------------------------------------------------------------------------

/// Tracks confirmation state for every strategy used in a run.
///
/// Records are created lazily on first use and never deleted within a run.
#[derive(Debug)]
pub struct ConfirmationTracker {
    records: Mutex<HashMap<String, ConfirmationRecord>>,
    confirm_threshold: u32,
    blacklist_threshold: u32,
}

impl Default for ConfirmationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationTracker {
    /// Create a tracker with the standard thresholds.
    pub fn new() -> Self {
        Self::with_thresholds(CONFIRMATION_THRESHOLD, BLACKLIST_THRESHOLD)
    }

    /// Create a tracker with explicit thresholds.
    pub fn with_thresholds(confirm_threshold: u32, blacklist_threshold: u32) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            confirm_threshold: confirm_threshold.max(1),
            blacklist_threshold: blacklist_threshold.max(1),
        }
    }

    /// Record the outcome of an attempt that used `strategy_name`.
    ///
    /// Returns the updated record. Incrementing one streak always zeroes the
    /// other; `confirmed` latches once the success streak reaches the
    /// threshold.
    pub fn record_outcome(&self, strategy_name: &str, success: bool) -> ConfirmationRecord {
        let mut records = self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = records.entry(strategy_name.to_string()).or_default();

        if success {
            record.consecutive_successes += 1;
            record.consecutive_failures = 0;
            if record.consecutive_successes >= self.confirm_threshold {
                record.confirmed = true;
            }
        } else {
            record.consecutive_failures += 1;
            record.consecutive_successes = 0;
        }

        record.clone()
    }

    /// Whether the given strategy is currently blacklisted.
    ///
    /// Unseen strategies are never skipped.
    pub fn should_skip(&self, strategy_name: &str) -> bool {
        let records = self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        records
            .get(strategy_name)
            .is_some_and(|r| r.should_skip(self.blacklist_threshold, self.confirm_threshold))
    }

    /// Whether the given strategy has been confirmed.
    pub fn is_confirmed(&self, strategy_name: &str) -> bool {
        let records = self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        records.get(strategy_name).is_some_and(|r| r.confirmed)
    }

    /// Snapshot of the current record for a strategy, if any.
    pub fn record(&self, strategy_name: &str) -> Option<ConfirmationRecord> {
        let records = self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        records.get(strategy_name).cloned()
    }

    /// Snapshot of all records, keyed by strategy name.
    pub fn snapshot(&self) -> HashMap<String, ConfirmationRecord> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_resets_failure_streak() {
        let tracker = ConfirmationTracker::new();
        tracker.record_outcome("box_formatting", false);
        tracker.record_outcome("box_formatting", false);
        let record = tracker.record_outcome("box_formatting", true);

        assert_eq!(record.consecutive_successes, 1);
        assert_eq!(record.consecutive_failures, 0);
    }

    #[test]
    fn test_failure_resets_success_streak() {
        let tracker = ConfirmationTracker::new();
        tracker.record_outcome("box_formatting", true);
        tracker.record_outcome("box_formatting", true);
        let record = tracker.record_outcome("box_formatting", false);

        assert_eq!(record.consecutive_failures, 1);
        assert_eq!(record.consecutive_successes, 0);
    }

    #[test]
    fn test_confirmed_after_three_successes() {
        let tracker = ConfirmationTracker::new();
        tracker.record_outcome("shorten_commentary", true);
        tracker.record_outcome("shorten_commentary", true);
        assert!(!tracker.is_confirmed("shorten_commentary"));

        tracker.record_outcome("shorten_commentary", true);
        assert!(tracker.is_confirmed("shorten_commentary"));
    }

    #[test]
    fn test_confirmation_latches_across_later_failures() {
        let tracker = ConfirmationTracker::new();
        for _ in 0..3 {
            tracker.record_outcome("shorten_commentary", true);
        }
        tracker.record_outcome("shorten_commentary", false);
        assert!(tracker.is_confirmed("shorten_commentary"));
    }

    #[test]
    fn test_skip_after_three_failures() {
        let tracker = ConfirmationTracker::new();
        for _ in 0..2 {
            tracker.record_outcome("table_format", false);
        }
        assert!(!tracker.should_skip("table_format"));

        tracker.record_outcome("table_format", false);
        assert!(tracker.should_skip("table_format"));
    }

    #[test]
    fn test_intervening_success_clears_skip() {
        let tracker = ConfirmationTracker::new();
        for _ in 0..3 {
            tracker.record_outcome("table_format", false);
        }
        assert!(tracker.should_skip("table_format"));

        tracker.record_outcome("table_format", true);
        assert!(!tracker.should_skip("table_format"));
    }

    #[test]
    fn test_unseen_strategy_not_skipped() {
        let tracker = ConfirmationTracker::new();
        assert!(!tracker.should_skip("never_used"));
        assert!(!tracker.is_confirmed("never_used"));
        assert!(tracker.record("never_used").is_none());
    }

    #[test]
    fn test_streaks_mutually_exclusive() {
        // Any interleaving keeps at most one streak non-zero.
        let tracker = ConfirmationTracker::new();
        let outcomes = [true, false, false, true, true, false, true];
        for outcome in outcomes {
            let record = tracker.record_outcome("mixed", outcome);
            assert!(
                record.consecutive_successes == 0 || record.consecutive_failures == 0,
                "both streaks non-zero: {record:?}"
            );
        }
    }
}
