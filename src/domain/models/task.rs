//! Task targets, results, and cooperative cancellation.
//!
//! A task (or target) is one end-to-end generation goal pursued across
//! multiple attempts. Exactly one loop instance owns a task's state for the
//! duration of the run; the result is always a structured [`TaskResult`],
//! never a raw error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attempt::Attempt;
use super::request::GenerationRequest;

// ---------------------------------------------------------------------------
// TargetSpec
// ---------------------------------------------------------------------------

/// Descriptor for one generation target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Unique identifier for this task run.
    pub id: Uuid,
    /// Human-readable target name (e.g. a template name).
    pub name: String,
    /// The initial generation input, before any strategy mutation.
    pub initial_input: GenerationRequest,
    /// Attempt budget override. `None` uses the engine default.
    pub max_attempts: Option<u32>,
}

impl TargetSpec {
    /// Create a target from a name and an initial input.
    pub fn new(name: impl Into<String>, initial_input: GenerationRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            initial_input,
            max_attempts: None,
        }
    }

    /// Set an attempt budget for this target.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

// ---------------------------------------------------------------------------
// TaskStatus / TaskResult
// ---------------------------------------------------------------------------

/// Terminal status of a task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Combined validation passed within the attempt budget.
    Succeeded,
    /// The attempt budget ran out without a passing attempt.
    Exhausted,
    /// No untried, non-blacklisted strategy remained in any category.
    StrategiesExhausted,
    /// The run was cancelled between attempts.
    Cancelled,
}

/// A single entry in the strategy audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyApplication {
    /// The attempt the strategy was applied before.
    pub attempt: u32,
    /// Strategy name.
    pub strategy: String,
    /// Strategy category name.
    pub category: String,
    /// Selection confidence at the time of application (0.0 to 1.0).
    pub confidence: f64,
}

/// The outer record for one target.
///
/// Created when a target starts, finalized on success, exhaustion, strategy
/// exhaustion, or cancellation, then persisted to the memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// The task run this result belongs to.
    pub task_id: Uuid,
    /// Target name.
    pub name: String,
    /// Ordered attempt history.
    pub attempts: Vec<Attempt>,
    /// Whether combined validation ever passed.
    pub success: bool,
    /// Terminal status.
    pub status: TaskStatus,
    /// Score of the final (or best, on exhaustion) attempt.
    pub final_score: f64,
    /// Best combined score seen across all attempts.
    pub best_score: f64,
    /// Ordered audit trail of strategy applications.
    pub strategies_applied: Vec<StrategyApplication>,
    /// Total wall-clock time across attempts, in milliseconds.
    pub total_duration_ms: u64,
    /// Total estimated cost across attempts, in dollars.
    pub total_cost: f64,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl TaskResult {
    /// The best-scoring attempt, if any attempts were made.
    pub fn best_attempt(&self) -> Option<&Attempt> {
        self.attempts.iter().max_by(|a, b| {
            a.score()
                .partial_cmp(&b.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

// ---------------------------------------------------------------------------
// CancelHandle
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag for a running target.
///
/// The loop checks the flag at the top of each iteration, never mid-call:
/// third-party generation calls are not preemptible. Cloning the handle
/// shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Create a fresh, uncancelled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect before the next attempt.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
