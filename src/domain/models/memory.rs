//! Persistent learning state.
//!
//! The memory snapshot is what survives between runs: per-strategy success
//! rates, confirmation state, and a compact history of finished tasks. It is
//! deliberately flat and serde-friendly so any persistence sink can store it
//! verbatim.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::TaskStatus;

/// Learned statistics for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    /// Total attempts this strategy was applied to.
    pub attempts: u32,
    /// Attempts that passed combined validation.
    pub successes: u32,
    /// Exponentially-weighted success rate.
    pub success_rate: f64,
    /// Whether the strategy has been confirmed reliable.
    pub confirmed: bool,
    /// Whether the strategy has been blacklisted.
    pub blacklisted: bool,
    /// When this strategy was last applied.
    pub last_used: Option<DateTime<Utc>>,
}

impl StrategyStats {
    /// Fresh stats with the given starting success rate.
    pub const fn with_initial_rate(initial_rate: f64) -> Self {
        Self {
            attempts: 0,
            successes: 0,
            success_rate: initial_rate,
            confirmed: false,
            blacklisted: false,
            last_used: None,
        }
    }
}

/// A compact record of one finished task run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Target name.
    pub name: String,
    /// Terminal status.
    pub status: TaskStatus,
    /// Attempts made.
    pub attempts: u32,
    /// Final combined score.
    pub final_score: f64,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

/// The full persistent state of the memory store.
///
/// `BTreeMap` keeps serialization order stable, which keeps persisted files
/// diffable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Per-strategy learned statistics, keyed by strategy name.
    pub strategies: BTreeMap<String, StrategyStats>,
    /// Finished task runs, oldest first.
    pub runs: Vec<RunRecord>,
    /// Total attempts observed across all runs.
    #[serde(default)]
    pub total_attempts: u64,
    /// Attempts that passed combined validation.
    #[serde(default)]
    pub passed_attempts: u64,
}

/// Aggregate view of everything the loop has learned so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySummary {
    /// Total attempts observed across all runs.
    pub total_attempts: u64,
    /// Attempts that passed combined validation.
    pub passed_attempts: u64,
    /// Total finished task runs.
    pub total_runs: usize,
    /// Runs that ended in success.
    pub successful_runs: usize,
    /// Fraction of runs that succeeded, or 0.0 with no runs.
    pub run_success_rate: f64,
    /// Names of confirmed strategies.
    pub confirmed_strategies: Vec<String>,
    /// Names of blacklisted strategies.
    pub blacklisted_strategies: Vec<String>,
    /// Strategies ranked by success rate, best first, with their rates.
    /// Only strategies with at least one recorded attempt appear.
    pub top_strategies: Vec<(String, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_roundtrip() {
        let mut snapshot = MemorySnapshot::default();
        snapshot.strategies.insert(
            "shorten_commentary".to_string(),
            StrategyStats {
                attempts: 4,
                successes: 3,
                success_rate: 0.71,
                confirmed: true,
                blacklisted: false,
                last_used: Some(Utc::now()),
            },
        );
        snapshot.runs.push(RunRecord {
            name: "Daily Rate Update".to_string(),
            status: TaskStatus::Succeeded,
            attempts: 3,
            final_score: 100.0,
            finished_at: Utc::now(),
        });

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MemorySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
