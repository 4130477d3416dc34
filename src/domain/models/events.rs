//! Loop lifecycle events.
//!
//! Events are an observability surface only: the engine emits them through
//! `tracing` as structured log records, and no control flow ever branches on
//! whether or how they were observed.

use serde::{Deserialize, Serialize};

use super::task::TaskStatus;

/// A notable moment in a task run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LoopEvent {
    /// A new attempt is starting.
    AttemptStarted {
        /// Target name.
        target: String,
        /// 1-based attempt number.
        attempt: u32,
        /// Attempt budget for the run.
        max_attempts: u32,
    },
    /// An attempt finished (with or without validation).
    AttemptFinished {
        /// Target name.
        target: String,
        /// 1-based attempt number.
        attempt: u32,
        /// Combined score, 0.0 when generation failed.
        score: f64,
        /// Whether combined validation passed.
        passed: bool,
    },
    /// A strategy was selected for the next attempt.
    StrategySelected {
        /// Target name.
        target: String,
        /// Strategy name.
        strategy: String,
        /// Strategy category name.
        category: String,
        /// Selection confidence (0.0 to 1.0).
        confidence: f64,
    },
    /// A strategy reached its confirmation threshold.
    StrategyConfirmed {
        /// Strategy name.
        strategy: String,
    },
    /// A strategy was blacklisted and replaced mid-run.
    StrategyBlacklisted {
        /// Strategy name.
        strategy: String,
        /// Name of the substitute strategy, if one was found.
        substitute: Option<String>,
    },
    /// A validator channel was disabled by self-diagnostics.
    ChannelDisabled {
        /// Channel name.
        channel: String,
    },
    /// The task run reached a terminal state.
    TaskFinished {
        /// Target name.
        target: String,
        /// Terminal status.
        status: TaskStatus,
        /// Final combined score.
        final_score: f64,
        /// Number of attempts made.
        attempts: u32,
    },
}

impl LoopEvent {
    /// Emit this event as a structured `tracing` record.
    pub fn emit(&self) {
        match self {
            Self::AttemptStarted {
                target,
                attempt,
                max_attempts,
            } => {
                tracing::info!(target_name = %target, attempt, max_attempts, "attempt started");
            }
            Self::AttemptFinished {
                target,
                attempt,
                score,
                passed,
            } => {
                tracing::info!(target_name = %target, attempt, score, passed, "attempt finished");
            }
            Self::StrategySelected {
                target,
                strategy,
                category,
                confidence,
            } => {
                tracing::info!(
                    target_name = %target,
                    strategy = %strategy,
                    category = %category,
                    confidence,
                    "strategy selected"
                );
            }
            Self::StrategyConfirmed { strategy } => {
                tracing::info!(strategy = %strategy, "strategy confirmed");
            }
            Self::StrategyBlacklisted {
                strategy,
                substitute,
            } => {
                tracing::warn!(
                    strategy = %strategy,
                    substitute = ?substitute,
                    "strategy blacklisted"
                );
            }
            Self::ChannelDisabled { channel } => {
                tracing::warn!(channel = %channel, "validator channel disabled");
            }
            Self::TaskFinished {
                target,
                status,
                final_score,
                attempts,
            } => {
                tracing::info!(
                    target_name = %target,
                    status = ?status,
                    final_score,
                    attempts,
                    "task finished"
                );
            }
        }
    }
}
