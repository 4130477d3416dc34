//! Configuration structures for the quality loop.

use serde::{Deserialize, Serialize};

/// Main configuration structure for Anneal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Generation loop configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Strategy selection configuration
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Confirmation tracking configuration
    #[serde(default)]
    pub confirmation: ConfirmationConfig,

    /// Validator self-diagnostics configuration
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Memory store configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Default attempt budget per target
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Timeout for a single generator call, in milliseconds
    #[serde(default = "default_generator_timeout_ms")]
    pub generator_timeout_ms: u64,

    /// Timeout for a single validator channel call, in milliseconds
    #[serde(default = "default_validator_timeout_ms")]
    pub validator_timeout_ms: u64,

    /// Score ceiling while running in degraded validation mode
    #[serde(default = "default_degraded_score_cap")]
    pub degraded_score_cap: f64,

    /// Flat cost estimate per attempt, in dollars
    #[serde(default = "default_cost_per_attempt")]
    pub cost_per_attempt: f64,
}

const fn default_max_attempts() -> u32 {
    15
}

const fn default_generator_timeout_ms() -> u64 {
    120_000
}

const fn default_validator_timeout_ms() -> u64 {
    60_000
}

const fn default_degraded_score_cap() -> f64 {
    95.0
}

const fn default_cost_per_attempt() -> f64 {
    0.03
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            generator_timeout_ms: default_generator_timeout_ms(),
            validator_timeout_ms: default_validator_timeout_ms(),
            degraded_score_cap: default_degraded_score_cap(),
            cost_per_attempt: default_cost_per_attempt(),
        }
    }
}

/// Strategy selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SelectionConfig {
    /// Attempts drawn from each category before advancing to the next
    #[serde(default = "default_attempts_per_category")]
    pub attempts_per_category: u32,

    /// Weight of diagnosis-label/strategy-name similarity
    #[serde(default = "default_name_weight")]
    pub name_weight: f64,

    /// Weight of the historical success rate
    #[serde(default = "default_rate_weight")]
    pub rate_weight: f64,

    /// Weight of the analyst-supplied confidence
    #[serde(default = "default_confidence_weight")]
    pub confidence_weight: f64,

    /// Minimum combined score before falling back to best-by-rate
    #[serde(default = "default_min_combined_score")]
    pub min_combined_score: f64,
}

const fn default_attempts_per_category() -> u32 {
    3
}

const fn default_name_weight() -> f64 {
    0.3
}

const fn default_rate_weight() -> f64 {
    0.4
}

const fn default_confidence_weight() -> f64 {
    0.3
}

const fn default_min_combined_score() -> f64 {
    0.4
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            attempts_per_category: default_attempts_per_category(),
            name_weight: default_name_weight(),
            rate_weight: default_rate_weight(),
            confidence_weight: default_confidence_weight(),
            min_combined_score: default_min_combined_score(),
        }
    }
}

/// Confirmation tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfirmationConfig {
    /// Consecutive successes required to confirm a strategy
    #[serde(default = "default_confirm_threshold")]
    pub confirm_threshold: u32,

    /// Consecutive failures required to blacklist a strategy
    #[serde(default = "default_blacklist_threshold")]
    pub blacklist_threshold: u32,
}

const fn default_confirm_threshold() -> u32 {
    3
}

const fn default_blacklist_threshold() -> u32 {
    3
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            confirm_threshold: default_confirm_threshold(),
            blacklist_threshold: default_blacklist_threshold(),
        }
    }
}

/// Validator self-diagnostics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiagnosticsConfig {
    /// Minimum per-channel observations before evaluating
    #[serde(default = "default_min_samples")]
    pub min_samples: u32,

    /// Failure rate above which a channel is suspect
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: f64,

    /// Success rate a sibling channel must exceed
    #[serde(default = "default_success_threshold")]
    pub success_threshold: f64,
}

const fn default_min_samples() -> u32 {
    10
}

const fn default_failure_threshold() -> f64 {
    0.9
}

const fn default_success_threshold() -> f64 {
    0.9
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
        }
    }
}

/// Memory store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoryConfig {
    /// Learning rate for the exponentially-weighted success rate
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Success rate assigned to strategies on first observation
    #[serde(default = "default_initial_rate")]
    pub initial_rate: f64,
}

const fn default_learning_rate() -> f64 {
    0.3
}

const fn default_initial_rate() -> f64 {
    0.5
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            initial_rate: default_initial_rate(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rolling log files
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Whether to also log to stdout when file logging is enabled
    #[serde(default = "default_enable_stdout")]
    pub enable_stdout: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

const fn default_enable_stdout() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_stdout: default_enable_stdout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let selection = SelectionConfig::default();
        let sum = selection.name_weight + selection.rate_weight + selection.confidence_weight;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.max_attempts, 15);
        assert_eq!(config.confirmation.confirm_threshold, 3);
        assert_eq!(config.diagnostics.min_samples, 10);
        assert!((config.memory.learning_rate - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_yaml_overlays_defaults() {
        let yaml = r"
engine:
  max_attempts: 5
selection:
  attempts_per_category: 4
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert_eq!(config.engine.max_attempts, 5);
        assert_eq!(config.selection.attempts_per_category, 4);
        // Untouched sections keep their defaults.
        assert_eq!(config.confirmation.blacklist_threshold, 3);
    }
}
