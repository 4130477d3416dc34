//! Typed generation request with idempotent rendering directives.
//!
//! The request handed to a generator is not a bare prompt string. Remediation
//! strategies mutate *structured* fields -- word limits, replacement maps,
//! boxed elements, layout flags -- and the final prompt is rendered from them
//! on demand. Because every directive is a set-or-overwrite field rather than
//! a textual splice, re-applying the same strategy can never duplicate an
//! instruction inside the prompt.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// The input to one generation attempt.
///
/// Holds the freeform base prompt plus the accumulated rendering directives
/// that strategies have layered on top of it. [`render`](Self::render)
/// produces the string actually sent to the generator backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The freeform base prompt describing what to generate.
    pub body: String,

    /// Structured directives accumulated from applied strategies.
    pub directives: Directives,
}

impl GenerationRequest {
    /// Create a request from a base prompt with no directives.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            directives: Directives::default(),
        }
    }

    /// Render the final prompt string for the generator.
    ///
    /// Word replacements are applied to the body; every other directive is
    /// emitted as a deterministic instruction line. Directive ordering is
    /// fixed so identical requests always render identically.
    pub fn render(&self) -> String {
        let d = &self.directives;

        let mut body = self.body.clone();
        for (from, to) in &d.word_replacements {
            body = replace_word_case_insensitive(&body, from, to);
        }

        let mut lines: Vec<String> = Vec::new();

        if let Some(max) = d.commentary_word_limit {
            lines.push(format!(
                "Keep commentary to at most {max} words. Truncate anything longer."
            ));
        }
        if let Some(max) = d.sentence_word_limit {
            lines.push(format!(
                "Break any sentence over {max} words into shorter sentences."
            ));
        }
        if let Some(max) = d.phrase_word_limit {
            lines.push(format!(
                "CRITICAL: every text phrase must be {max} words or less."
            ));
        }
        for (element, style) in &d.boxed_elements {
            lines.push(format!(
                "Display the {element} in a distinct {} box/card for better rendering.",
                style.as_str()
            ));
        }
        for (element, case) in &d.case_transforms {
            lines.push(format!(
                "Format the {element} in {} for better rendering.",
                case.as_str()
            ));
        }
        for (element, weight) in &d.weight_overrides {
            lines.push(format!("Render the {element} with {} weight.", weight.as_str()));
        }
        if let Some(style) = d.list_format {
            lines.push(format!(
                "Format all text elements as a {} list for clarity.",
                style.as_str()
            ));
        }
        if d.table_format {
            lines.push("Present tabular data in a grid table layout.".to_string());
        }
        if d.spacing == Spacing::Increased {
            lines.push("Add generous spacing between all text elements.".to_string());
        }
        if d.emphasize_numbers {
            lines.push("Give numerical figures visual priority over prose.".to_string());
        }
        if let Some(ratio) = d.text_ratio {
            lines.push(format!(
                "Limit text to roughly {:.0}% of the composition; fill the rest with visual elements.",
                ratio * 100.0
            ));
        }
        match d.layout {
            Layout::Standard => {}
            Layout::Redesign => lines.push(
                "Discard the previous layout entirely and compose a radically different design."
                    .to_string(),
            ),
            Layout::Minimalist => lines.push(
                "Strip the design to essential elements only; maximize clarity.".to_string(),
            ),
        }
        if d.creative_mode {
            lines.push(
                "You may depart from the stated layout if a more reliable rendering exists."
                    .to_string(),
            );
        }

        if lines.is_empty() {
            body
        } else {
            format!("{}\n\n{}", body, lines.join("\n"))
        }
    }
}

/// Replace whole-word, case-insensitive occurrences of `from` with `to`.
///
/// Word boundaries are ASCII-alphanumeric; this is enough for the vocabulary
/// substitution strategies, which target plain English words. The scan walks
/// the original text char by char, so surrounding non-ASCII content (whose
/// lowercase form may have a different byte length) cannot shift offsets.
fn replace_word_case_insensitive(text: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut skip_until = 0;

    for (i, ch) in text.char_indices() {
        if i < skip_until {
            continue;
        }

        let boundary_before = i == 0
            || !text[..i]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_alphanumeric());
        if boundary_before {
            if let Some(len) = match_len_ignore_case(&text[i..], from) {
                let boundary_after = !text[i + len..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphanumeric());
                if boundary_after {
                    out.push_str(to);
                    skip_until = i + len;
                    continue;
                }
            }
        }

        out.push(ch);
    }
    out
}

/// Byte length of a case-insensitive match of `needle` at the start of
/// `haystack`, if one exists. The length is measured in the haystack's own
/// bytes, so it is always a valid slice offset there.
fn match_len_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let mut hay = haystack.chars();
    let mut len = 0;
    for n in needle.chars() {
        let h = hay.next()?;
        if !h.to_lowercase().eq(n.to_lowercase()) {
            return None;
        }
        len += h.len_utf8();
    }
    Some(len)
}

// ---------------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------------

/// Structured rendering directives.
///
/// Every field is set-or-overwrite: applying the same strategy twice leaves
/// the directives (and therefore the rendered prompt) unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directives {
    /// Maximum word count for the commentary element.
    pub commentary_word_limit: Option<usize>,

    /// Maximum words per sentence before splitting.
    pub sentence_word_limit: Option<usize>,

    /// Maximum words per phrase anywhere in the output.
    pub phrase_word_limit: Option<usize>,

    /// Whole-word substitutions applied to the body at render time.
    pub word_replacements: BTreeMap<String, String>,

    /// Elements to wrap in a box/card, keyed by element name.
    pub boxed_elements: BTreeMap<String, BoxStyle>,

    /// Case transforms per element.
    pub case_transforms: BTreeMap<String, CaseTransform>,

    /// Font weight overrides per element.
    pub weight_overrides: BTreeMap<String, TextWeight>,

    /// Format all text content as a list.
    pub list_format: Option<ListStyle>,

    /// Present data in a grid table.
    pub table_format: bool,

    /// Spacing between text elements.
    pub spacing: Spacing,

    /// Prioritize numerical data over prose.
    pub emphasize_numbers: bool,

    /// Target text-to-visual ratio (0.0 to 1.0).
    pub text_ratio: Option<f64>,

    /// Overall layout directive.
    pub layout: Layout,

    /// Allow the backend creative latitude over the stated layout.
    pub creative_mode: bool,
}

/// Box rendering style for a boxed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxStyle {
    /// Plain border box.
    Border,
    /// Drop-shadow box.
    Shadow,
}

impl BoxStyle {
    /// Stable lowercase name used in rendered instructions.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Border => "bordered",
            Self::Shadow => "shadow",
        }
    }
}

/// Case transform for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseTransform {
    /// Render the element in all capitals.
    Uppercase,
}

impl CaseTransform {
    /// Stable lowercase name used in rendered instructions.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uppercase => "ALL CAPS",
        }
    }
}

/// Font weight override for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextWeight {
    /// Bold weight.
    Bold,
}

impl TextWeight {
    /// Stable lowercase name used in rendered instructions.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bold => "bold",
        }
    }
}

/// List formatting style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStyle {
    /// Numbered list.
    Numbered,
    /// Bulleted list.
    Bulleted,
}

impl ListStyle {
    /// Stable lowercase name used in rendered instructions.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numbered => "numbered",
            Self::Bulleted => "bulleted",
        }
    }
}

/// Spacing between text elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    /// Default spacing.
    #[default]
    Normal,
    /// Increased spacing between elements.
    Increased,
}

/// Overall layout directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Keep the layout described by the body.
    #[default]
    Standard,
    /// Compose a radically different layout.
    Redesign,
    /// Strip to essential elements only.
    Minimalist,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
