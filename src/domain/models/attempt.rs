//! Attempt records and validation results.
//!
//! An [`Attempt`] is one generate-then-validate cycle. It is created at the
//! start of a loop iteration, filled in as the generator and validators
//! report back, and immutable once validation completes -- from then on it
//! only travels: appended to the task's history and to the memory store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::GenerationRequest;

// ---------------------------------------------------------------------------
// ArtifactRef
// ---------------------------------------------------------------------------

/// Opaque handle to a produced artifact.
///
/// The loop is agnostic to payload type; a reference may be a file path, a
/// URL, or any identifier the caller's generator and validators agree on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef(pub String);

impl ArtifactRef {
    /// Create a reference from any identifier.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The underlying identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// Taxonomy tag for a validator-reported defect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Misspelled or garbled text.
    Typo,
    /// A required element is absent.
    MissingElement,
    /// Layout or formatting defect.
    Formatting,
    /// Backend rendering artifact (smearing, clipping).
    Rendering,
    /// Content present but wrong or oversimplified.
    Content,
    /// Anything else, with a free-form tag.
    Other(String),
}

impl IssueCategory {
    /// Stable lowercase label for this category.
    pub fn label(&self) -> &str {
        match self {
            Self::Typo => "typo",
            Self::MissingElement => "missing_element",
            Self::Formatting => "formatting",
            Self::Rendering => "rendering",
            Self::Content => "content",
            Self::Other(tag) => tag,
        }
    }
}

/// A single defect reported by a validator channel.
///
/// Produced by validators, consumed by strategy selection; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Taxonomy tag.
    pub category: IssueCategory,
    /// Human-readable description.
    pub message: String,
    /// Optional ordinal severity (higher is worse).
    pub severity: Option<u8>,
}

impl Issue {
    /// Create an issue with no severity.
    pub fn new(category: IssueCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            severity: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelReport / ValidationOutcome
// ---------------------------------------------------------------------------

/// The verdict of one validator channel on one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelReport {
    /// Quality score from 0 to 100.
    pub score: f64,
    /// Whether this channel considers the artifact acceptable.
    pub pass: bool,
    /// Defects found by this channel, in reported order.
    pub issues: Vec<Issue>,
}

impl ChannelReport {
    /// A passing report with the given score and no issues.
    pub fn passing(score: f64) -> Self {
        Self {
            score,
            pass: true,
            issues: Vec::new(),
        }
    }

    /// A failing report with the given score and issues.
    pub fn failing(score: f64, issues: Vec<Issue>) -> Self {
        Self {
            score,
            pass: false,
            issues,
        }
    }
}

/// The combined validation verdict across all active channels.
///
/// Success requires every active channel to pass independently. The combined
/// score is 100 only when every channel agrees; otherwise it is the minimum
/// score across the channels that reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Combined score from 0 to 100.
    pub score: f64,
    /// Whether all active channels passed.
    pub pass: bool,
    /// Per-channel reports, keyed by channel name, in evaluation order.
    pub channel_reports: Vec<(String, ChannelReport)>,
}

impl ValidationOutcome {
    /// All issues across all channels, in channel order.
    pub fn all_issues(&self) -> Vec<Issue> {
        self.channel_reports
            .iter()
            .flat_map(|(_, r)| r.issues.iter().cloned())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Attempt
// ---------------------------------------------------------------------------

/// One generation-validate cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based ordinal within the task run.
    pub number: u32,
    /// The (possibly strategy-mutated) input used for this attempt.
    pub input: GenerationRequest,
    /// Name of the strategy applied before this attempt, if any.
    /// `None` on the first attempt. A retry after a generation error keeps
    /// the prior strategy's name, since its transformed input is resent.
    pub strategy_applied: Option<String>,
    /// Handle to the produced artifact. `None` when generation failed.
    pub artifact: Option<ArtifactRef>,
    /// Combined validation verdict. `None` when generation failed.
    pub validation: Option<ValidationOutcome>,
    /// Error message when the generator call itself failed.
    pub generation_error: Option<String>,
    /// Wall-clock duration of the whole cycle in milliseconds.
    pub duration_ms: u64,
    /// Estimated cost of this attempt in dollars.
    pub cost_estimate: f64,
    /// When the attempt record was finalized.
    pub recorded_at: DateTime<Utc>,
}

impl Attempt {
    /// The combined score of this attempt, or 0.0 if it never validated.
    pub fn score(&self) -> f64 {
        self.validation.as_ref().map_or(0.0, |v| v.score)
    }

    /// Whether this attempt passed combined validation.
    pub fn passed(&self) -> bool {
        self.validation.as_ref().is_some_and(|v| v.pass)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_category_labels() {
        assert_eq!(IssueCategory::Typo.label(), "typo");
        assert_eq!(IssueCategory::MissingElement.label(), "missing_element");
        assert_eq!(IssueCategory::Other("glare".to_string()).label(), "glare");
    }

    #[test]
    fn test_outcome_collects_all_issues() {
        let outcome = ValidationOutcome {
            score: 60.0,
            pass: false,
            channel_reports: vec![
                (
                    "vision".to_string(),
                    ChannelReport::failing(
                        60.0,
                        vec![Issue::new(IssueCategory::Typo, "MORTGGAGE")],
                    ),
                ),
                (
                    "ocr".to_string(),
                    ChannelReport::failing(
                        70.0,
                        vec![Issue::new(IssueCategory::MissingElement, "no NMLS id")],
                    ),
                ),
            ],
        };
        let issues = outcome.all_issues();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].category, IssueCategory::Typo);
    }

    #[test]
    fn test_attempt_score_defaults_to_zero() {
        let attempt = Attempt {
            number: 1,
            input: GenerationRequest::new("x"),
            strategy_applied: None,
            artifact: None,
            validation: None,
            generation_error: Some("quota exceeded".to_string()),
            duration_ms: 12,
            cost_estimate: 0.0,
            recorded_at: Utc::now(),
        };
        assert_eq!(attempt.score(), 0.0);
        assert!(!attempt.passed());
    }

    #[test]
    fn test_channel_report_serialization_roundtrip() {
        let report = ChannelReport::failing(
            42.5,
            vec![Issue {
                category: IssueCategory::Formatting,
                message: "commentary overflows card".to_string(),
                severity: Some(2),
            }],
        );
        let json = serde_json::to_string(&report).unwrap();
        let back: ChannelReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
