//! Strategy selection.
//!
//! Selection blends three signals into one score per candidate strategy:
//! how well the strategy's name matches the analyst's recommended approach,
//! the strategy's learned success rate, and the analyst's confidence. The
//! candidate pool rotates through the four categories as attempts
//! accumulate, so a run that keeps failing on text tweaks eventually gets
//! pushed toward visual formatting and, later, full redesigns.

use std::collections::HashSet;

use crate::domain::errors::LoopError;
use crate::domain::models::config::SelectionConfig;
use crate::domain::models::confirmation::ConfirmationTracker;
use crate::domain::models::strategy::{Strategy, StrategyCatalog, StrategyCategory};
use crate::domain::ports::analyst::Diagnosis;
use crate::services::memory_store::MemoryStore;

/// The outcome of one selection round.
#[derive(Debug, Clone)]
pub struct SelectedStrategy {
    /// The chosen strategy.
    pub strategy: Strategy,
    /// Combined selection score (0.0 to 1.0) at the time of the choice.
    pub confidence: f64,
}

/// Chooses the next strategy to try for a failing target.
pub struct StrategySelector {
    catalog: StrategyCatalog,
    config: SelectionConfig,
}

impl StrategySelector {
    /// Create a selector over the given catalog.
    pub const fn new(catalog: StrategyCatalog, config: SelectionConfig) -> Self {
        Self { catalog, config }
    }

    /// The catalog this selector draws from.
    pub const fn catalog(&self) -> &StrategyCatalog {
        &self.catalog
    }

    /// Select a strategy for the given failed attempt.
    ///
    /// `failed_attempts` is the number of failed attempts so far and drives
    /// category rotation; `tried` and the tracker's blacklist shrink the
    /// candidate pool. Candidates from the current category are preferred;
    /// when the category is spent, later categories (wrapping) are searched
    /// in rotation order, so a failed strategy is never repeated while an
    /// untried one exists anywhere.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::StrategiesExhausted`] when no untried,
    /// non-blacklisted strategy remains in any category.
    pub fn select(
        &self,
        failed_attempts: u32,
        tried: &HashSet<String>,
        diagnosis: &Diagnosis,
        memory: &MemoryStore,
        tracker: &ConfirmationTracker,
    ) -> Result<SelectedStrategy, LoopError> {
        // The upcoming attempt is one past the failures so far.
        let start =
            StrategyCategory::for_attempt(failed_attempts + 1, self.config.attempts_per_category);

        let mut category = start;
        for _ in 0..StrategyCategory::ORDERED.len() {
            let candidates = self.candidates(category, tried, tracker);
            if !candidates.is_empty() {
                return Ok(self.pick(&candidates, diagnosis, memory));
            }
            category = category.next();
        }

        Err(LoopError::StrategiesExhausted {
            attempts: failed_attempts,
        })
    }

    /// Find a replacement for a just-blacklisted strategy, drawn from a
    /// different category with untried strategies.
    ///
    /// Returns `None` when no other category has a viable candidate; the
    /// caller then falls back to ordinary rotation on the next attempt.
    pub fn substitute(
        &self,
        blacklisted: &Strategy,
        tried: &HashSet<String>,
        memory: &MemoryStore,
        tracker: &ConfirmationTracker,
    ) -> Option<SelectedStrategy> {
        let mut category = blacklisted.category.next();
        while category != blacklisted.category {
            let candidates = self.candidates(category, tried, tracker);
            if !candidates.is_empty() {
                return Some(self.pick(&candidates, &Diagnosis::default(), memory));
            }
            category = category.next();
        }
        None
    }

    fn candidates<'a>(
        &'a self,
        category: StrategyCategory,
        tried: &HashSet<String>,
        tracker: &ConfirmationTracker,
    ) -> Vec<&'a Strategy> {
        self.catalog
            .for_category(category)
            .into_iter()
            .filter(|s| !tried.contains(&s.name) && !tracker.should_skip(&s.name))
            .collect()
    }

    /// Score the candidates and pick the winner.
    ///
    /// When the best combined score clears the configured minimum, it wins.
    /// Otherwise nothing matched the diagnosis well enough and the candidate
    /// with the best learned success rate wins instead.
    fn pick(
        &self,
        candidates: &[&Strategy],
        diagnosis: &Diagnosis,
        memory: &MemoryStore,
    ) -> SelectedStrategy {
        let scored: Vec<(f64, &Strategy)> = candidates
            .iter()
            .map(|s| (self.combined_score(s, diagnosis, memory), *s))
            .collect();

        let best = scored
            .iter()
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        if let Some(&(score, strategy)) = best {
            if score >= self.config.min_combined_score {
                return SelectedStrategy {
                    strategy: strategy.clone(),
                    confidence: score,
                };
            }
        }

        let fallback = scored
            .iter()
            .max_by(|a, b| {
                let ra = memory.success_rate(&a.1.name);
                let rb = memory.success_rate(&b.1.name);
                ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|&(score, strategy)| SelectedStrategy {
                strategy: strategy.clone(),
                confidence: score,
            });

        // `candidates` is non-empty, so `scored` is too.
        fallback.unwrap_or_else(|| SelectedStrategy {
            strategy: candidates[0].clone(),
            confidence: 0.0,
        })
    }

    fn combined_score(&self, strategy: &Strategy, diagnosis: &Diagnosis, memory: &MemoryStore) -> f64 {
        let (name_similarity, confidence) = diagnosis
            .recommendations
            .iter()
            .map(|rec| {
                let by_name = fuzzy_match(&strategy.name, &rec.approach);
                let by_description = fuzzy_match(&strategy.description, &rec.approach);
                (by_name.max(by_description), rec.confidence)
            })
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0.0, 0.0));

        let rate = memory.success_rate(&strategy.name);

        self.config.name_weight * name_similarity
            + self.config.rate_weight * rate
            + self.config.confidence_weight * confidence
    }
}

/// Similarity between a strategy name and a recommended approach.
///
/// Exact match (after normalization) scores 1.0, containment either way
/// scores 0.8, and anything else scores the Jaccard overlap of the two
/// character sets. Normalization lowercases and treats underscores as
/// spaces so `"shorten_commentary"` matches "shorten commentary".
pub fn fuzzy_match(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.8;
    }

    let set_a: HashSet<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let set_b: HashSet<char> = b.chars().filter(|c| !c.is_whitespace()).collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace('_', " ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
