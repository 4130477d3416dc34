//! Remediation strategies and the static strategy catalog.
//!
//! A strategy is not "retry" -- it is a specific, named change to the next
//! generation input. Strategies are grouped into ordered categories that the
//! selection logic walks through as attempts accumulate: first cheap text
//! fixes, then visual formatting, then backend-specific tricks, and finally
//! creative departures.
//!
//! All strategies are defined statically at startup. Transforms are pure
//! functions over [`GenerationRequest`] and are idempotent by construction:
//! they set structured directive fields rather than splicing text, so
//! applying a strategy twice yields the same request as applying it once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::request::{
    BoxStyle, CaseTransform, GenerationRequest, Layout, ListStyle, Spacing, TextWeight,
};

// ---------------------------------------------------------------------------
// StrategyCategory
// ---------------------------------------------------------------------------

/// Ordered strategy categories.
///
/// The ordering is load-bearing: the selection rule advances through the
/// categories as a function of attempt number, wrapping after the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyCategory {
    /// Fixes targeting text content itself (length, vocabulary).
    TextOptimization,
    /// Fixes using visual structure (boxes, caps, spacing).
    VisualFormatting,
    /// Tricks that play to the generation backend's known strengths.
    ModelExploitation,
    /// Creative departures when the standard approaches keep failing.
    Innovation,
}

impl StrategyCategory {
    /// All categories in selection order.
    pub const ORDERED: [Self; 4] = [
        Self::TextOptimization,
        Self::VisualFormatting,
        Self::ModelExploitation,
        Self::Innovation,
    ];

    /// The category to draw from for a given 1-based attempt number.
    ///
    /// Attempts `1..=window` draw from the first category, the next `window`
    /// from the second, and so on, wrapping after the last category.
    pub fn for_attempt(attempt: u32, window: u32) -> Self {
        let window = window.max(1);
        let idx = ((attempt.saturating_sub(1)) / window) as usize % Self::ORDERED.len();
        Self::ORDERED[idx]
    }

    /// Position of this category in the selection order.
    pub fn ordinal(self) -> usize {
        Self::ORDERED
            .iter()
            .position(|c| *c == self)
            .unwrap_or(0)
    }

    /// The next category in order, wrapping after the last.
    pub fn next(self) -> Self {
        Self::ORDERED[(self.ordinal() + 1) % Self::ORDERED.len()]
    }

    /// Stable lowercase name, suitable for use as a map key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextOptimization => "text_optimization",
            Self::VisualFormatting => "visual_formatting",
            Self::ModelExploitation => "model_exploitation",
            Self::Innovation => "innovation",
        }
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// A pure, idempotent change to a generation request.
///
/// Each variant sets structured directive fields on the request. None of them
/// splice instruction text directly, so double application cannot corrupt the
/// input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Cap the commentary element at `max_words` words.
    LimitCommentaryWords {
        /// Maximum word count.
        max_words: usize,
    },
    /// Replace known-problematic words with safer alternatives.
    ReplaceWords {
        /// Substitution map, applied whole-word and case-insensitively.
        replacements: BTreeMap<String, String>,
    },
    /// Break sentences longer than `max_words` into shorter ones.
    SplitSentences {
        /// Maximum words per sentence.
        max_words: usize,
    },
    /// Wrap an element in a box/card.
    BoxElement {
        /// Element to box (e.g. "commentary").
        element: String,
        /// Box rendering style.
        style: BoxStyle,
    },
    /// Apply a case transform to an element.
    TransformCase {
        /// Element to transform.
        element: String,
        /// The case transform to apply.
        case: CaseTransform,
    },
    /// Increase spacing between text elements.
    IncreaseSpacing,
    /// Override an element's font weight.
    WeightElement {
        /// Element to adjust.
        element: String,
        /// Weight to apply.
        weight: TextWeight,
    },
    /// Format all text content as a list.
    FormatAsList {
        /// List style.
        style: ListStyle,
    },
    /// Present data in a grid table.
    FormatAsTable,
    /// Cap every phrase at `max_words` words.
    LimitPhraseWords {
        /// Maximum words per phrase.
        max_words: usize,
    },
    /// Prioritize numerical data over prose.
    EmphasizeNumbers,
    /// Reduce text share of the composition to `text_ratio`.
    ReduceTextRatio {
        /// Target text-to-visual ratio (0.0 to 1.0).
        text_ratio: f64,
    },
    /// Discard the current layout and compose a radically different one.
    Redesign,
    /// Strip the design to bare essentials.
    Minimalist,
    /// Apply several transforms in sequence.
    Combine {
        /// Transforms to apply, in order.
        transforms: Vec<Transform>,
    },
    /// Grant the backend creative latitude over the stated layout.
    CreativeMode,
}

impl Transform {
    /// Apply this transform, producing a new request.
    ///
    /// Pure: the input request is not mutated. Idempotent: applying the
    /// result again yields an equal request.
    pub fn apply(&self, request: &GenerationRequest) -> GenerationRequest {
        let mut next = request.clone();
        let d = &mut next.directives;

        match self {
            Self::LimitCommentaryWords { max_words } => {
                d.commentary_word_limit = Some(*max_words);
            }
            Self::ReplaceWords { replacements } => {
                for (from, to) in replacements {
                    d.word_replacements.insert(from.clone(), to.clone());
                }
            }
            Self::SplitSentences { max_words } => {
                d.sentence_word_limit = Some(*max_words);
            }
            Self::BoxElement { element, style } => {
                d.boxed_elements.insert(element.clone(), *style);
            }
            Self::TransformCase { element, case } => {
                d.case_transforms.insert(element.clone(), *case);
            }
            Self::IncreaseSpacing => {
                d.spacing = Spacing::Increased;
            }
            Self::WeightElement { element, weight } => {
                d.weight_overrides.insert(element.clone(), *weight);
            }
            Self::FormatAsList { style } => {
                d.list_format = Some(*style);
            }
            Self::FormatAsTable => {
                d.table_format = true;
            }
            Self::LimitPhraseWords { max_words } => {
                d.phrase_word_limit = Some(*max_words);
            }
            Self::EmphasizeNumbers => {
                d.emphasize_numbers = true;
            }
            Self::ReduceTextRatio { text_ratio } => {
                d.text_ratio = Some(*text_ratio);
            }
            Self::Redesign => {
                d.layout = Layout::Redesign;
            }
            Self::Minimalist => {
                d.layout = Layout::Minimalist;
            }
            Self::Combine { transforms } => {
                for t in transforms {
                    next = t.apply(&next);
                }
            }
            Self::CreativeMode => {
                d.creative_mode = true;
            }
        }

        next
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// A named remediation strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    /// Unique key for this strategy.
    pub name: String,
    /// The category this strategy belongs to.
    pub category: StrategyCategory,
    /// Human-readable description of what the strategy does.
    pub description: String,
    /// The transform applied to the generation input.
    pub transform: Transform,
}

impl Strategy {
    fn new(
        name: &str,
        category: StrategyCategory,
        description: &str,
        transform: Transform,
    ) -> Self {
        Self {
            name: name.to_string(),
            category,
            description: description.to_string(),
            transform,
        }
    }
}

// ---------------------------------------------------------------------------
// StrategyCatalog
// ---------------------------------------------------------------------------

/// The fixed taxonomy of remediation strategies.
///
/// Built once at startup; strategies are never created or destroyed at
/// runtime, only selected and applied.
#[derive(Debug, Clone)]
pub struct StrategyCatalog {
    strategies: Vec<Strategy>,
}

impl StrategyCatalog {
    /// Build a catalog from an explicit strategy list.
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// The standard catalog: eighteen strategies across the four categories.
    pub fn standard() -> Self {
        use StrategyCategory as C;

        let problem_words: BTreeMap<String, String> = [
            ("weave", "create"),
            ("leave", "exit"),
            ("breathe", "pause"),
            ("achieve", "reach"),
            ("believe", "think"),
        ]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

        let simple_words: BTreeMap<String, String> = [
            ("approximately", "about"),
            ("significant", "big"),
            ("opportunity", "chance"),
            ("demonstrate", "show"),
            ("comprehensive", "full"),
        ]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

        let strategies = vec![
            // --- Text Optimization ---
            Strategy::new(
                "shorten_commentary",
                C::TextOptimization,
                "Reduce commentary to 8-10 words",
                Transform::LimitCommentaryWords { max_words: 10 },
            ),
            Strategy::new(
                "simplify_vocabulary",
                C::TextOptimization,
                "Replace complex words with simpler alternatives",
                Transform::ReplaceWords {
                    replacements: simple_words,
                },
            ),
            Strategy::new(
                "split_long_sentences",
                C::TextOptimization,
                "Break sentences over 12 words into shorter ones",
                Transform::SplitSentences { max_words: 12 },
            ),
            Strategy::new(
                "avoid_problem_words",
                C::TextOptimization,
                "Replace words known to cause typos",
                Transform::ReplaceWords {
                    replacements: problem_words,
                },
            ),
            // --- Visual Formatting ---
            Strategy::new(
                "box_formatting",
                C::VisualFormatting,
                "Put commentary in a distinct bordered box/card",
                Transform::BoxElement {
                    element: "commentary".to_string(),
                    style: BoxStyle::Border,
                },
            ),
            Strategy::new(
                "shadow_box",
                C::VisualFormatting,
                "Add a shadow box around problematic text",
                Transform::BoxElement {
                    element: "commentary".to_string(),
                    style: BoxStyle::Shadow,
                },
            ),
            Strategy::new(
                "all_caps_format",
                C::VisualFormatting,
                "Format commentary in ALL CAPS for better rendering",
                Transform::TransformCase {
                    element: "commentary".to_string(),
                    case: CaseTransform::Uppercase,
                },
            ),
            Strategy::new(
                "increase_spacing",
                C::VisualFormatting,
                "Add more spacing between text elements",
                Transform::IncreaseSpacing,
            ),
            Strategy::new(
                "bold_headers",
                C::VisualFormatting,
                "Make headers bold for clearer rendering",
                Transform::WeightElement {
                    element: "headers".to_string(),
                    weight: TextWeight::Bold,
                },
            ),
            // --- Model Exploitation ---
            Strategy::new(
                "use_structured_list",
                C::ModelExploitation,
                "Format content as a numbered list",
                Transform::FormatAsList {
                    style: ListStyle::Numbered,
                },
            ),
            Strategy::new(
                "table_format",
                C::ModelExploitation,
                "Present data in table format",
                Transform::FormatAsTable,
            ),
            Strategy::new(
                "short_phrases_only",
                C::ModelExploitation,
                "Use only phrases under 6 words",
                Transform::LimitPhraseWords { max_words: 6 },
            ),
            Strategy::new(
                "emphasize_numbers",
                C::ModelExploitation,
                "Focus on numerical data, which renders reliably",
                Transform::EmphasizeNumbers,
            ),
            Strategy::new(
                "minimal_text_visual_heavy",
                C::ModelExploitation,
                "Reduce text, increase visual elements",
                Transform::ReduceTextRatio { text_ratio: 0.3 },
            ),
            // --- Innovation ---
            Strategy::new(
                "complete_redesign",
                C::Innovation,
                "Completely different layout approach",
                Transform::Redesign,
            ),
            Strategy::new(
                "minimalist_approach",
                C::Innovation,
                "Strip to bare essentials, maximum clarity",
                Transform::Minimalist,
            ),
            Strategy::new(
                "hybrid_format",
                C::Innovation,
                "Combine boxed commentary with shortened text",
                Transform::Combine {
                    transforms: vec![
                        Transform::BoxElement {
                            element: "commentary".to_string(),
                            style: BoxStyle::Border,
                        },
                        Transform::LimitCommentaryWords { max_words: 10 },
                    ],
                },
            ),
            Strategy::new(
                "creative_latitude",
                C::Innovation,
                "Let the backend propose its own rendering approach",
                Transform::CreativeMode,
            ),
        ];

        Self::new(strategies)
    }

    /// All strategies, in catalog order.
    pub fn all(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Strategies belonging to the given category, in catalog order.
    pub fn for_category(&self, category: StrategyCategory) -> Vec<&Strategy> {
        self.strategies
            .iter()
            .filter(|s| s.category == category)
            .collect()
    }

    /// Look up a strategy by name.
    pub fn get(&self, name: &str) -> Option<&Strategy> {
        self.strategies.iter().find(|s| s.name == name)
    }

    /// Number of strategies in the catalog.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_rotation_by_attempt() {
        assert_eq!(
            StrategyCategory::for_attempt(1, 3),
            StrategyCategory::TextOptimization
        );
        assert_eq!(
            StrategyCategory::for_attempt(3, 3),
            StrategyCategory::TextOptimization
        );
        assert_eq!(
            StrategyCategory::for_attempt(4, 3),
            StrategyCategory::VisualFormatting
        );
        assert_eq!(
            StrategyCategory::for_attempt(7, 3),
            StrategyCategory::ModelExploitation
        );
        assert_eq!(
            StrategyCategory::for_attempt(10, 3),
            StrategyCategory::Innovation
        );
        // Wraps after the last category.
        assert_eq!(
            StrategyCategory::for_attempt(13, 3),
            StrategyCategory::TextOptimization
        );
    }

    #[test]
    fn test_category_next_wraps() {
        assert_eq!(
            StrategyCategory::Innovation.next(),
            StrategyCategory::TextOptimization
        );
    }

    #[test]
    fn test_standard_catalog_names_unique() {
        let catalog = StrategyCatalog::standard();
        let mut names: Vec<&str> = catalog.all().iter().map(|s| s.name.as_str()).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before, "strategy names must be unique");
    }

    #[test]
    fn test_standard_catalog_covers_all_categories() {
        let catalog = StrategyCatalog::standard();
        for category in StrategyCategory::ORDERED {
            assert!(
                !catalog.for_category(category).is_empty(),
                "category {category:?} has no strategies"
            );
        }
    }

    #[test]
    fn test_transforms_are_idempotent() {
        let catalog = StrategyCatalog::standard();
        let base = GenerationRequest::new(
            "Daily rate update. Expert commentary: rates continue to weave between highs and lows.",
        );

        for strategy in catalog.all() {
            let once = strategy.transform.apply(&base);
            let twice = strategy.transform.apply(&once);
            assert_eq!(
                once, twice,
                "strategy {} is not idempotent",
                strategy.name
            );
            assert_eq!(once.render(), twice.render());
        }
    }

    #[test]
    fn test_transforms_do_not_mutate_input() {
        let base = GenerationRequest::new("Base prompt");
        let copy = base.clone();
        let catalog = StrategyCatalog::standard();
        for strategy in catalog.all() {
            let _ = strategy.transform.apply(&base);
        }
        assert_eq!(base, copy);
    }

    #[test]
    fn test_combine_applies_all_parts() {
        let catalog = StrategyCatalog::standard();
        let hybrid = catalog.get("hybrid_format").unwrap();
        let out = hybrid.transform.apply(&GenerationRequest::new("Base"));
        assert_eq!(
            out.directives.boxed_elements.get("commentary"),
            Some(&BoxStyle::Border)
        );
        assert_eq!(out.directives.commentary_word_limit, Some(10));
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = StrategyCatalog::standard();
        assert!(catalog.get("shorten_commentary").is_some());
        assert!(catalog.get("no_such_strategy").is_none());
    }
}
