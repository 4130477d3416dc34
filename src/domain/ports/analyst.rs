//! Analyst port.

use async_trait::async_trait;

use crate::domain::errors::LoopError;
use crate::domain::models::attempt::Attempt;

/// A suggested line of attack for the next attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRecommendation {
    /// Free-form approach label, fuzzy-matched against strategy names
    /// during selection (e.g. "shorten commentary", "avoid problem words").
    pub approach: String,
    /// Analyst confidence in this approach (0.0 to 1.0).
    pub confidence: f64,
}

/// The analyst's read on why an attempt failed.
#[derive(Debug, Clone, Default)]
pub struct Diagnosis {
    /// Short description of the dominant failure pattern.
    pub summary: String,
    /// Recommended approaches, best first. May be empty when the analyst
    /// has nothing actionable, in which case selection falls back to
    /// category rotation alone.
    pub recommendations: Vec<StrategyRecommendation>,
}

/// Diagnoses failed attempts and recommends what to try next.
///
/// The built-in heuristic analyst maps issue categories straight to
/// approach labels; richer implementations can consult a model. The loop
/// never fails because of a broken analyst -- a diagnosis error is logged
/// and selection proceeds without recommendations.
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Analyze the failed attempt in the context of the run so far.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Validation`] when analysis itself fails.
    async fn diagnose(&self, failed: &Attempt, history: &[Attempt]) -> Result<Diagnosis, LoopError>;
}
