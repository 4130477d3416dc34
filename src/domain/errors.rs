//! Error taxonomy for the quality loop.
//!
//! The loop distinguishes errors by how they affect control flow rather than
//! by where they originated. A generation error burns an attempt; a
//! validation error is a failed verdict; a persistence error is logged and
//! swallowed; strategy exhaustion and cancellation end the run. Callers of
//! the engine never see a raw error for a completed run -- they get a
//! structured task result.

use thiserror::Error;

/// Errors surfaced by the quality loop and its components.
#[derive(Debug, Error)]
pub enum LoopError {
    /// The generator failed to produce an artifact.
    ///
    /// Consumes an attempt from the budget. Strategy confirmation state is
    /// not updated for the failed attempt because no artifact was validated.
    #[error("generation failed: {0}")]
    Generation(String),

    /// A validator channel failed to produce a verdict.
    ///
    /// Treated as a failing verdict for that channel, never as a crash.
    #[error("validation failed on channel '{channel}': {message}")]
    Validation {
        /// Channel that failed to report.
        channel: String,
        /// What went wrong.
        message: String,
    },

    /// A generator or validator call exceeded its deadline.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The deadline that was exceeded.
        timeout_ms: u64,
    },

    /// Every non-blacklisted strategy in every category has been tried.
    #[error("all strategies exhausted after {attempts} attempts")]
    StrategiesExhausted {
        /// Attempts made before exhaustion.
        attempts: u32,
    },

    /// The memory store could not be persisted or loaded.
    ///
    /// Never fatal to a run; the loop logs it and continues with in-memory
    /// state only.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// Cancellation was requested through the task's cancel handle.
    #[error("task cancelled")]
    Cancelled,
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or merged.
    #[error("failed to load configuration: {0}")]
    Load(String),

    /// A loaded value failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LoopError::Timeout {
            operation: "generator".to_string(),
            timeout_ms: 120_000,
        };
        assert_eq!(err.to_string(), "generator timed out after 120000ms");

        let err = LoopError::StrategiesExhausted { attempts: 7 };
        assert_eq!(err.to_string(), "all strategies exhausted after 7 attempts");
    }
}
