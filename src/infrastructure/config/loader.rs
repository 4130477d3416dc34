use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};

use crate::domain::errors::ConfigError;
use crate::domain::models::config::Config;

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. anneal.yaml in the working directory, if present
    /// 3. Environment variables (`ANNEAL_*` prefix, `__` as section separator)
    ///
    /// # Errors
    ///
    /// Fails when the sources cannot be merged or the merged values fail
    /// validation.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("anneal.yaml"))
            .merge(Env::prefixed("ANNEAL_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, or when the merged
    /// values fail validation.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid value found.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.engine.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_attempts must be at least 1".to_string(),
            ));
        }
        if config.engine.generator_timeout_ms == 0 || config.engine.validator_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "engine timeouts must be positive".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&config.engine.degraded_score_cap) {
            return Err(ConfigError::Invalid(format!(
                "engine.degraded_score_cap must be within 0..=100, got {}",
                config.engine.degraded_score_cap
            )));
        }

        if config.selection.attempts_per_category == 0 {
            return Err(ConfigError::Invalid(
                "selection.attempts_per_category must be at least 1".to_string(),
            ));
        }
        for (name, weight) in [
            ("selection.name_weight", config.selection.name_weight),
            ("selection.rate_weight", config.selection.rate_weight),
            (
                "selection.confidence_weight",
                config.selection.confidence_weight,
            ),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within 0..=1, got {weight}"
                )));
            }
        }

        if config.confirmation.confirm_threshold == 0 || config.confirmation.blacklist_threshold == 0
        {
            return Err(ConfigError::Invalid(
                "confirmation thresholds must be at least 1".to_string(),
            ));
        }

        if config.diagnostics.min_samples == 0 {
            return Err(ConfigError::Invalid(
                "diagnostics.min_samples must be at least 1".to_string(),
            ));
        }
        for (name, rate) in [
            (
                "diagnostics.failure_threshold",
                config.diagnostics.failure_threshold,
            ),
            (
                "diagnostics.success_threshold",
                config.diagnostics.success_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within 0..=1, got {rate}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&config.memory.learning_rate)
            || !(0.0..=1.0).contains(&config.memory.initial_rate)
        {
            return Err(ConfigError::Invalid(
                "memory rates must be within 0..=1".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of trace, debug, info, warn, error; got {}",
                config.logging.level
            )));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be json or pretty; got {}",
                config.logging.format
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{EngineConfig, LoggingConfig, SelectionConfig};
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_load_from_file_overlays_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anneal.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "engine:\n  max_attempts: 7").unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.engine.max_attempts, 7);
        // Everything else keeps its default.
        assert_eq!(config.selection.attempts_per_category, 3);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = Config {
            engine: EngineConfig {
                max_attempts: 0,
                ..EngineConfig::default()
            },
            ..Config::default()
        };
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_out_of_range_weight_rejected() {
        let config = Config {
            selection: SelectionConfig {
                rate_weight: 1.5,
                ..SelectionConfig::default()
            },
            ..Config::default()
        };
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let config = Config {
            logging: LoggingConfig {
                level: "verbose".to_string(),
                ..LoggingConfig::default()
            },
            ..Config::default()
        };
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }
}
