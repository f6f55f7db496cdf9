//! Engine configuration loading.
//!
//! Pricing profiles, estimation constants, and the fixed EUR rate are data,
//! not code: they are loaded here once at startup and threaded into the
//! engine by value. Sources, in increasing precedence: built-in defaults, an
//! optional TOML file, then `CTXPACK_`-prefixed environment variables
//! (`__`-separated, e.g. `CTXPACK_EUR_USD_RATE`).

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::budget::EstimatorConfig;
use crate::provider::Provider;

/// Default config file stem looked up in the working directory.
pub const DEFAULT_CONFIG_STEM: &str = "ctxpack";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "CTXPACK";

/// Fixed EUR to USD conversion rate used when none is configured. Never
/// fetched live; a fixed rate keeps repeated runs deterministic.
pub const DEFAULT_EUR_USD_RATE: f64 = 1.08;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Underlying loader failure (missing file, bad TOML, type mismatch).
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// `chars_per_token` must be positive for estimates to be finite.
    #[error("estimator chars_per_token must be positive, got {0}")]
    InvalidCharsPerToken(f64),

    /// Whitespace multipliers shrink estimates; symbol multipliers grow them.
    #[error("invalid estimator band: {0}")]
    InvalidBand(String),

    /// The EUR rate must be positive to be invertible for display.
    #[error("eur_usd_rate must be positive, got {0}")]
    InvalidEurRate(f64),

    /// Two providers share an id.
    #[error("duplicate provider id \"{0}\"")]
    DuplicateProvider(String),

    /// A provider declared an unusable context window.
    #[error("provider \"{0}\" has a zero context window")]
    ZeroContextWindow(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed EUR to USD conversion rate.
    pub eur_usd_rate: f64,
    /// Token estimation constants.
    pub estimator: EstimatorConfig,
    /// Provider pricing profiles for the registry.
    pub providers: Vec<Provider>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eur_usd_rate: DEFAULT_EUR_USD_RATE,
            estimator: EstimatorConfig::default(),
            providers: default_providers(),
        }
    }
}

impl EngineConfig {
    /// Load configuration, layering an optional file and environment
    /// overrides on top of the defaults, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&EngineConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_STEM).required(false)),
        };
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the loaded values for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.estimator.chars_per_token > 0.0) {
            return Err(ConfigError::InvalidCharsPerToken(
                self.estimator.chars_per_token,
            ));
        }
        if !(self.eur_usd_rate > 0.0) {
            return Err(ConfigError::InvalidEurRate(self.eur_usd_rate));
        }
        for band in &self.estimator.whitespace_bands {
            if band.multiplier > 1.0 {
                return Err(ConfigError::InvalidBand(format!(
                    "whitespace multiplier {} exceeds 1.0",
                    band.multiplier
                )));
            }
        }
        for band in &self.estimator.symbol_bands {
            if band.multiplier < 1.0 {
                return Err(ConfigError::InvalidBand(format!(
                    "symbol multiplier {} is below 1.0",
                    band.multiplier
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for provider in &self.providers {
            if !seen.insert(provider.id.as_str()) {
                return Err(ConfigError::DuplicateProvider(provider.id.clone()));
            }
            if provider.context_window == 0 {
                return Err(ConfigError::ZeroContextWindow(provider.id.clone()));
            }
        }
        Ok(())
    }
}

/// Built-in pricing profiles. Overridable wholesale from the config file;
/// prices are USD per million tokens.
fn default_providers() -> Vec<Provider> {
    let table = [
        ("claude-opus", "Claude Opus", 200_000u64, 15.00, 75.00),
        ("claude-sonnet", "Claude Sonnet", 200_000, 3.00, 15.00),
        ("claude-haiku", "Claude Haiku", 200_000, 0.80, 4.00),
        ("gpt-4o", "GPT-4o", 128_000, 2.50, 10.00),
        ("gpt-4o-mini", "GPT-4o mini", 128_000, 0.15, 0.60),
        ("gemini-flash", "Gemini 2.0 Flash", 1_000_000, 0.10, 0.40),
    ];
    table
        .into_iter()
        .map(
            |(id, name, window, input, output)| Provider {
                id: id.to_string(),
                display_name: name.to_string(),
                context_window: window,
                input_cost_per_million: input,
                output_cost_per_million: output,
            },
        )
        .collect()
}
