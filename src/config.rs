//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - config.toml (default configuration)
//! - config.local.toml (git-ignored local overrides)
//! - Environment variables (`RULEIND_*` prefix)
//!
//! ## Example
//!
//! ```toml
//! # config.toml
//! [induction]
//! default_grow_measure = "g2"
//! default_prune_measure = "precision"
//! default_seed = 0.5
//!
//! [cross_validation]
//! folds = 10
//! runs = 1
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! RULEIND_INDUCTION__DEFAULT_SEED=0.25
//! RULEIND_CROSS_VALIDATION__FOLDS=5
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub induction: InductionConfig,
    #[serde(default)]
    pub cross_validation: CrossValidationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied by the engine call surface when a caller omits a
/// parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InductionConfig {
    /// Quality measure identifier used while growing rules.
    #[serde(default = "default_grow_measure")]
    pub default_grow_measure: String,

    /// Quality measure identifier used while pruning rules and computing
    /// confidence degrees.
    #[serde(default = "default_prune_measure")]
    pub default_prune_measure: String,

    /// Default RNG seed in `[0, 1]`, mapped to a `u64` at entry.
    #[serde(default = "default_seed")]
    pub default_seed: f64,
}

/// Cross-validation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidationConfig {
    #[serde(default = "default_folds")]
    pub folds: usize,

    #[serde(default = "default_runs")]
    pub runs: usize,

    #[serde(default)]
    pub every_class_in_fold: bool,
}

fn default_grow_measure() -> String {
    "g2".to_string()
}
fn default_prune_measure() -> String {
    "precision".to_string()
}
fn default_seed() -> f64 {
    0.5
}
fn default_folds() -> usize {
    10
}
fn default_runs() -> usize {
    1
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        CrossValidationConfig {
            folds: default_folds(),
            runs: default_runs(),
            every_class_in_fold: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Merges in order:
    /// 1. `config.toml` (base configuration)
    /// 2. `config.local.toml` (local overrides, git-ignored)
    /// 3. Environment variables (`RULEIND_*` prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("RULEIND_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("RULEIND_").split("__"))
            .extract()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            induction: InductionConfig {
                default_grow_measure: default_grow_measure(),
                default_prune_measure: default_prune_measure(),
                default_seed: default_seed(),
            },
            cross_validation: CrossValidationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
