//! Cross-run strategy memory.
//!
//! The store keeps per-strategy success rates as an exponentially-weighted
//! moving average: recent outcomes count more than old ones, so a strategy
//! that worked against last month's backend but fails against this month's
//! loses its standing quickly. All reads and writes go through a single
//! in-memory snapshot; the persistence sink only ever sees whole snapshots.
//!
//! Persistence is best-effort everywhere. A store that cannot load or save
//! logs the failure and keeps serving from memory -- learning degrades to
//! per-process instead of cross-run, but the loop never stops for it.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::domain::models::config::MemoryConfig;
use crate::domain::models::memory::{MemorySnapshot, MemorySummary, RunRecord, StrategyStats};
use crate::domain::models::task::{TaskResult, TaskStatus};
use crate::domain::ports::sink::PersistenceSink;

/// In-memory strategy statistics with optional durable backing.
pub struct MemoryStore {
    state: Mutex<MemorySnapshot>,
    config: MemoryConfig,
    sink: Option<Arc<dyn PersistenceSink>>,
}

impl MemoryStore {
    /// Create a store with no durable backing.
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            state: Mutex::new(MemorySnapshot::default()),
            config,
            sink: None,
        }
    }

    /// Create a store backed by a persistence sink.
    pub fn with_sink(config: MemoryConfig, sink: Arc<dyn PersistenceSink>) -> Self {
        Self {
            state: Mutex::new(MemorySnapshot::default()),
            config,
            sink: Some(sink),
        }
    }

    /// Load any previously persisted snapshot into the store.
    ///
    /// Call once before the first run. A load failure is logged and leaves
    /// the store empty.
    pub async fn hydrate(&self) {
        let Some(sink) = &self.sink else {
            return;
        };
        match sink.load().await {
            Ok(Some(snapshot)) => {
                let strategies = snapshot.strategies.len();
                let runs = snapshot.runs.len();
                *self.lock() = snapshot;
                tracing::info!(strategies, runs, "memory snapshot loaded");
            }
            Ok(None) => {
                tracing::debug!("no prior memory snapshot found");
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load memory snapshot; starting empty");
            }
        }
    }

    /// The learned success rate for a strategy, or the configured initial
    /// rate when the strategy has never been observed.
    pub fn success_rate(&self, strategy: &str) -> f64 {
        self.lock()
            .strategies
            .get(strategy)
            .map_or(self.config.initial_rate, |s| s.success_rate)
    }

    /// Whether a strategy has been blacklisted.
    pub fn is_blacklisted(&self, strategy: &str) -> bool {
        self.lock()
            .strategies
            .get(strategy)
            .is_some_and(|s| s.blacklisted)
    }

    /// Whether a strategy has been confirmed.
    pub fn is_confirmed(&self, strategy: &str) -> bool {
        self.lock()
            .strategies
            .get(strategy)
            .is_some_and(|s| s.confirmed)
    }

    /// Count one finished attempt in the global totals.
    pub fn record_attempt(&self, passed: bool) {
        let mut state = self.lock();
        state.total_attempts += 1;
        if passed {
            state.passed_attempts += 1;
        }
    }

    /// Fold one attempt outcome into a strategy's statistics.
    pub fn record_strategy_outcome(&self, strategy: &str, success: bool) {
        let initial = self.config.initial_rate;
        let alpha = self.config.learning_rate;

        let mut state = self.lock();
        let stats = state
            .strategies
            .entry(strategy.to_string())
            .or_insert_with(|| StrategyStats::with_initial_rate(initial));

        stats.attempts += 1;
        if success {
            stats.successes += 1;
            stats.success_rate += alpha * (1.0 - stats.success_rate);
        } else {
            stats.success_rate *= 1.0 - alpha;
        }
        stats.last_used = Some(Utc::now());
    }

    /// Mark a strategy as confirmed reliable.
    pub fn mark_confirmed(&self, strategy: &str) {
        let initial = self.config.initial_rate;
        let mut state = self.lock();
        state
            .strategies
            .entry(strategy.to_string())
            .or_insert_with(|| StrategyStats::with_initial_rate(initial))
            .confirmed = true;
    }

    /// Mark a strategy as blacklisted in the persisted record.
    ///
    /// Reporting state only: live selection consults the confirmation
    /// tracker, where a success streak can lift a blacklist again.
    pub fn mark_blacklisted(&self, strategy: &str) {
        let initial = self.config.initial_rate;
        let mut state = self.lock();
        state
            .strategies
            .entry(strategy.to_string())
            .or_insert_with(|| StrategyStats::with_initial_rate(initial))
            .blacklisted = true;
    }

    /// Record a finished run and persist the updated snapshot.
    pub async fn record_task_result(&self, result: &TaskResult) {
        {
            let mut state = self.lock();
            state.runs.push(RunRecord {
                name: result.name.clone(),
                status: result.status,
                attempts: result.attempts.len() as u32,
                final_score: result.final_score,
                finished_at: result.finished_at,
            });
        }
        self.persist().await;
    }

    /// Persist the current snapshot through the sink, if one is configured.
    /// Failures are logged, never propagated.
    pub async fn persist(&self) {
        let Some(sink) = &self.sink else {
            return;
        };
        let snapshot = self.lock().clone();
        if let Err(err) = sink.save(&snapshot).await {
            tracing::warn!(error = %err, "failed to persist memory snapshot");
        }
    }

    /// Aggregate view of the learned state.
    pub fn summary(&self) -> MemorySummary {
        let state = self.lock();

        let successful_runs = state
            .runs
            .iter()
            .filter(|r| r.status == TaskStatus::Succeeded)
            .count();
        let total_runs = state.runs.len();

        let mut confirmed = Vec::new();
        let mut blacklisted = Vec::new();
        let mut ranked: Vec<(String, f64)> = Vec::new();
        for (name, stats) in &state.strategies {
            if stats.confirmed {
                confirmed.push(name.clone());
            }
            if stats.blacklisted {
                blacklisted.push(name.clone());
            }
            if stats.attempts > 0 {
                ranked.push((name.clone(), stats.success_rate));
            }
        }
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        MemorySummary {
            total_attempts: state.total_attempts,
            passed_attempts: state.passed_attempts,
            total_runs,
            successful_runs,
            run_success_rate: if total_runs == 0 {
                0.0
            } else {
                successful_runs as f64 / total_runs as f64
            },
            confirmed_strategies: confirmed,
            blacklisted_strategies: blacklisted,
            top_strategies: ranked,
        }
    }

    /// A copy of the current snapshot.
    pub fn snapshot(&self) -> MemorySnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySnapshot> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
