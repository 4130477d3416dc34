//! Rule-based failure analysis.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::errors::LoopError;
use crate::domain::models::attempt::{Attempt, IssueCategory};
use crate::domain::ports::analyst::{Analyst, Diagnosis, StrategyRecommendation};

/// Maps validator issues straight to approach labels, no model calls.
///
/// The dominant issue category across the failed attempt decides the
/// recommendations. Repeat offenders get a confidence bump: a typo that
/// survived two different strategies argues harder for attacking the text
/// itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyst;

impl HeuristicAnalyst {
    /// Create the analyst.
    pub const fn new() -> Self {
        Self
    }

    fn recommendations_for(category: &IssueCategory, boost: f64) -> Vec<StrategyRecommendation> {
        let approaches: &[(&str, f64)] = match category {
            IssueCategory::Typo => &[
                ("avoid problem words", 0.8),
                ("shorten commentary", 0.6),
                ("all caps format", 0.5),
            ],
            IssueCategory::Formatting => &[
                ("box formatting", 0.7),
                ("increase spacing", 0.6),
                ("structured list", 0.5),
            ],
            IssueCategory::Rendering => &[
                ("minimal text visual heavy", 0.7),
                ("shadow box", 0.6),
                ("emphasize numbers", 0.5),
            ],
            IssueCategory::MissingElement => &[
                ("complete redesign", 0.6),
                ("table format", 0.5),
            ],
            IssueCategory::Content => &[
                ("simplify vocabulary", 0.7),
                ("split long sentences", 0.6),
            ],
            IssueCategory::Other(_) => &[("creative latitude", 0.4)],
        };

        approaches
            .iter()
            .map(|(approach, confidence)| StrategyRecommendation {
                approach: (*approach).to_string(),
                confidence: (confidence + boost).min(1.0),
            })
            .collect()
    }
}

#[async_trait]
impl Analyst for HeuristicAnalyst {
    async fn diagnose(&self, failed: &Attempt, history: &[Attempt]) -> Result<Diagnosis, LoopError> {
        let Some(validation) = &failed.validation else {
            return Ok(Diagnosis::default());
        };

        let issues = validation.all_issues();
        let mut counts: HashMap<&IssueCategory, usize> = HashMap::new();
        for issue in &issues {
            *counts.entry(&issue.category).or_insert(0) += 1;
        }

        let Some((dominant, _)) = counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(cat, count)| ((*cat).clone(), *count))
        else {
            return Ok(Diagnosis {
                summary: "failed without reported issues".to_string(),
                recommendations: vec![],
            });
        };

        // How many earlier attempts already failed with this category.
        let recurrences = history
            .iter()
            .filter(|a| a.number < failed.number)
            .filter(|a| {
                a.validation.as_ref().is_some_and(|v| {
                    v.all_issues().iter().any(|i| i.category == dominant)
                })
            })
            .count();
        let boost = (recurrences as f64 * 0.1).min(0.2);

        Ok(Diagnosis {
            summary: format!("dominant issue category: {}", dominant.label()),
            recommendations: Self::recommendations_for(&dominant, boost),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
