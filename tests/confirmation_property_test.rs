//! Property tests for confirmation tracking: streak bookkeeping must hold
//! under arbitrary outcome sequences.

use proptest::prelude::*;

use anneal::domain::models::confirmation::ConfirmationTracker;

proptest! {
    /// At most one streak is ever non-zero.
    #[test]
    fn streaks_are_mutually_exclusive(outcomes in prop::collection::vec(any::<bool>(), 0..50)) {
        let tracker = ConfirmationTracker::new();
        for outcome in outcomes {
            let record = tracker.record_outcome("s", outcome);
            prop_assert!(
                record.consecutive_successes == 0 || record.consecutive_failures == 0
            );
        }
    }

    /// Confirmation happens exactly when some window of three consecutive
    /// successes exists, and never un-happens.
    #[test]
    fn confirmation_matches_success_windows(outcomes in prop::collection::vec(any::<bool>(), 0..50)) {
        let tracker = ConfirmationTracker::new();
        let mut streak = 0u32;
        let mut expect_confirmed = false;
        for outcome in outcomes {
            streak = if outcome { streak + 1 } else { 0 };
            if streak >= 3 {
                expect_confirmed = true;
            }
            tracker.record_outcome("s", outcome);
            prop_assert_eq!(tracker.is_confirmed("s"), expect_confirmed);
        }
    }

    /// A strategy is skipped exactly while its failure streak is at the
    /// threshold or beyond.
    #[test]
    fn skip_tracks_failure_streak(outcomes in prop::collection::vec(any::<bool>(), 0..50)) {
        let tracker = ConfirmationTracker::new();
        let mut failure_streak = 0u32;
        for outcome in outcomes {
            failure_streak = if outcome { 0 } else { failure_streak + 1 };
            tracker.record_outcome("s", outcome);
            prop_assert_eq!(tracker.should_skip("s"), failure_streak >= 3);
        }
    }

    /// Streak counters never exceed the number of outcomes recorded.
    #[test]
    fn streaks_are_bounded_by_history(outcomes in prop::collection::vec(any::<bool>(), 1..50)) {
        let tracker = ConfirmationTracker::new();
        let total = outcomes.len() as u32;
        for outcome in outcomes {
            tracker.record_outcome("s", outcome);
        }
        let record = tracker.record("s").unwrap();
        prop_assert!(record.consecutive_successes <= total);
        prop_assert!(record.consecutive_failures <= total);
    }
}
