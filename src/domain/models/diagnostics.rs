//! Self-diagnostic monitoring of validator channels.
//!
//! When two independent validator channels disagree persistently -- one
//! failing almost every attempt while the other passes almost every attempt
//! -- the likeliest explanation is a broken validator, not broken artifacts.
//! The monitor aggregates per-channel outcomes and, once the divergence
//! pattern is statistically suspicious, disables the unreliable channel and
//! switches the run into degraded validation.
//!
//! The transition is one-way per run: a disabled channel stays disabled even
//! if its apparent rate later improves. Re-enabling would require
//! re-validating the channel against known-good artifacts, which the loop
//! has no way to obtain mid-run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Minimum observations before the monitor will evaluate at all.
pub const MIN_DIAGNOSTIC_SAMPLES: u32 = 10;

/// Failure-rate threshold above which a channel is considered broken.
pub const CHANNEL_FAILURE_THRESHOLD: f64 = 0.9;

/// Success-rate threshold a sibling channel must exceed for the broken
/// channel's failures to be attributed to the channel rather than the
/// artifacts.
pub const CHANNEL_SUCCESS_THRESHOLD: f64 = 0.9;

// ---------------------------------------------------------------------------
// ValidationMode
// ---------------------------------------------------------------------------

/// Current validation mode for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// All channels active and trusted.
    Normal,
    /// One channel has been judged unreliable and disabled.
    Degraded {
        /// Name of the disabled channel.
        disabled_channel: String,
    },
}

impl ValidationMode {
    /// Whether the run is in degraded mode.
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

// ---------------------------------------------------------------------------
// ChannelStats
// ---------------------------------------------------------------------------

/// Running outcome counts for one validator channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Number of observations where the channel passed.
    pub successes: u32,
    /// Number of observations where the channel failed.
    pub failures: u32,
}

impl ChannelStats {
    /// Total observations for this channel.
    pub const fn total(self) -> u32 {
        self.successes + self.failures
    }

    /// Fraction of observations that failed, or 0.0 with no data.
    pub fn failure_rate(self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            f64::from(self.failures) / f64::from(self.total())
        }
    }

    /// Fraction of observations that passed, or 0.0 with no data.
    pub fn success_rate(self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            f64::from(self.successes) / f64::from(self.total())
        }
    }
}

// ---------------------------------------------------------------------------
// DiagnosticState
// ---------------------------------------------------------------------------

/// Aggregate validator-reliability state for one run.
///
/// Owned by a single generation loop; not shared across targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticState {
    /// Per-channel outcome counts, keyed by channel name.
    pub channels: HashMap<String, ChannelStats>,
    /// Current validation mode.
    pub mode: ValidationMode,
    min_samples: u32,
    failure_threshold: f64,
    success_threshold: f64,
}

impl Default for DiagnosticState {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticState {
    /// Create a state with the standard thresholds.
    pub fn new() -> Self {
        Self::with_thresholds(
            MIN_DIAGNOSTIC_SAMPLES,
            CHANNEL_FAILURE_THRESHOLD,
            CHANNEL_SUCCESS_THRESHOLD,
        )
    }

    /// Create a state with explicit thresholds.
    pub fn with_thresholds(min_samples: u32, failure_threshold: f64, success_threshold: f64) -> Self {
        Self {
            channels: HashMap::new(),
            mode: ValidationMode::Normal,
            min_samples: min_samples.max(1),
            failure_threshold,
            success_threshold,
        }
    }

    /// Record one channel observation.
    pub fn record(&mut self, channel: &str, success: bool) {
        let stats = self.channels.entry(channel.to_string()).or_default();
        if success {
            stats.successes += 1;
        } else {
            stats.failures += 1;
        }
    }

    /// Whether the given channel is currently active.
    pub fn is_active(&self, channel: &str) -> bool {
        match &self.mode {
            ValidationMode::Normal => true,
            ValidationMode::Degraded { disabled_channel } => disabled_channel != channel,
        }
    }

    /// Total observations across all channels. Reporting only; evaluation
    /// is gated on per-channel sample sizes.
    pub fn total_observations(&self) -> u32 {
        self.channels.values().map(|s| s.total()).sum()
    }

    /// Evaluate the divergence pattern and possibly degrade.
    ///
    /// Returns the name of the channel that was disabled by this call, if
    /// any. The evaluation only runs while the mode is `Normal` (the
    /// transition is one-way per run) and only once the suspect channel has
    /// accumulated the minimum sample size. A channel is disabled when its
    /// failure rate exceeds the failure threshold while some other channel's
    /// success rate exceeds the success threshold over the same run.
    pub fn evaluate(&mut self) -> Option<String> {
        if self.mode.is_degraded() {
            return None;
        }

        let mut to_disable: Option<String> = None;
        for (name, stats) in &self.channels {
            if stats.total() < self.min_samples {
                continue;
            }
            if stats.failure_rate() <= self.failure_threshold {
                continue;
            }
            let sibling_healthy = self.channels.iter().any(|(other, other_stats)| {
                other != name
                    && other_stats.total() >= self.min_samples
                    && other_stats.success_rate() > self.success_threshold
            });
            if sibling_healthy {
                to_disable = Some(name.clone());
                break;
            }
        }

        if let Some(channel) = to_disable {
            tracing::warn!(
                channel = %channel,
                failure_rate = self.channels[&channel].failure_rate(),
                "validator channel judged unreliable; switching to degraded validation"
            );
            self.mode = ValidationMode::Degraded {
                disabled_channel: channel.clone(),
            };
            return Some(channel);
        }

        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(state: &mut DiagnosticState, channel: &str, successes: u32, failures: u32) {
        for _ in 0..successes {
            state.record(channel, true);
        }
        for _ in 0..failures {
            state.record(channel, false);
        }
    }

    #[test]
    fn test_no_decision_before_min_samples() {
        let mut state = DiagnosticState::new();
        feed(&mut state, "ocr", 0, 9);
        feed(&mut state, "vision", 9, 0);
        assert!(state.evaluate().is_none());
        assert_eq!(state.mode, ValidationMode::Normal);
    }

    #[test]
    fn test_degrades_on_divergence() {
        let mut state = DiagnosticState::new();
        feed(&mut state, "ocr", 0, 10);
        feed(&mut state, "vision", 10, 0);

        assert_eq!(state.evaluate(), Some("ocr".to_string()));
        assert!(state.mode.is_degraded());
        assert!(!state.is_active("ocr"));
        assert!(state.is_active("vision"));
    }

    #[test]
    fn test_no_degrade_when_both_failing() {
        // Both channels failing points at the artifacts, not a validator.
        let mut state = DiagnosticState::new();
        feed(&mut state, "ocr", 0, 12);
        feed(&mut state, "vision", 2, 10);
        assert!(state.evaluate().is_none());
        assert_eq!(state.mode, ValidationMode::Normal);
    }

    #[test]
    fn test_transition_is_one_way() {
        let mut state = DiagnosticState::new();
        feed(&mut state, "ocr", 0, 10);
        feed(&mut state, "vision", 10, 0);
        assert!(state.evaluate().is_some());

        // OCR recovers, vision collapses -- mode must not change.
        feed(&mut state, "ocr", 50, 0);
        feed(&mut state, "vision", 0, 50);
        assert!(state.evaluate().is_none());
        assert_eq!(
            state.mode,
            ValidationMode::Degraded {
                disabled_channel: "ocr".to_string()
            }
        );
    }

    #[test]
    fn test_rate_edges_are_strict() {
        // Exactly 90% failure does not trip the >0.9 threshold.
        let mut state = DiagnosticState::new();
        feed(&mut state, "ocr", 1, 9);
        feed(&mut state, "vision", 10, 0);
        assert!(state.evaluate().is_none());
    }

    #[test]
    fn test_channel_stats_rates() {
        let stats = ChannelStats {
            successes: 3,
            failures: 1,
        };
        assert!((stats.success_rate() - 0.75).abs() < f64::EPSILON);
        assert!((stats.failure_rate() - 0.25).abs() < f64::EPSILON);
        assert_eq!(ChannelStats::default().success_rate(), 0.0);
    }
}
