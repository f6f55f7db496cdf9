//! Token estimation utilities.
//!
//! We have no tokenizer dependency, so token counts are approximated from
//! character counts. Short content gets two density corrections on top of the
//! flat chars-per-token ratio; long content uses the flat ratio alone, where
//! local density variance averages out.

use serde::{Deserialize, Serialize};

/// A density band: applies `multiplier` when the measured ratio is at least
/// `min_ratio`. The band with the highest matching `min_ratio` wins,
/// regardless of list order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityBand {
    /// Lower bound (inclusive) of the density ratio for this band.
    pub min_ratio: f64,
    /// Multiplier applied to the flat estimate.
    pub multiplier: f64,
}

impl DensityBand {
    /// Create a new band.
    pub fn new(min_ratio: f64, multiplier: f64) -> Self {
        Self {
            min_ratio,
            multiplier,
        }
    }
}

/// Configuration for token estimation.
///
/// All thresholds and multipliers live here rather than in the algorithm, so
/// the loader can override any of them from file or environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Baseline characters-per-token ratio (roughly 4 for English and code).
    pub chars_per_token: f64,

    /// Above this many characters, skip density corrections and use the flat
    /// ratio alone.
    pub large_content_chars: usize,

    /// Whitespace-density bands (fraction of all characters that are
    /// whitespace). Multipliers are at most 1.0: denser whitespace tokenizes
    /// more efficiently. Below the lowest band the multiplier is 1.0.
    pub whitespace_bands: Vec<DensityBand>,

    /// Symbol-density bands (fraction of non-whitespace characters that are
    /// punctuation/operators). Multipliers are at least 1.0: symbol-dense
    /// content fragments into more tokens. Below the lowest band the
    /// multiplier is 1.0.
    pub symbol_bands: Vec<DensityBand>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            chars_per_token: 4.0,
            large_content_chars: 50_000,
            whitespace_bands: vec![
                DensityBand::new(0.30, 0.80),
                DensityBand::new(0.20, 0.90),
                DensityBand::new(0.12, 0.95),
            ],
            symbol_bands: vec![
                DensityBand::new(0.30, 1.25),
                DensityBand::new(0.20, 1.15),
                DensityBand::new(0.10, 1.05),
            ],
        }
    }
}

/// Token estimator for counting tokens from text or raw sizes.
///
/// Pure and deterministic: the same input always yields the same count. Both
/// the selection engine and the bundle renderer must go through the same
/// estimator instance (or one built from the same config) so their totals
/// agree.
#[derive(Debug, Clone, Default)]
pub struct TokenEstimator {
    config: EstimatorConfig,
}

impl TokenEstimator {
    /// Create an estimator from configuration.
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration in use.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate tokens for a piece of text.
    ///
    /// Empty text estimates to 0. Large content uses the flat ratio; anything
    /// at or below the threshold is corrected for whitespace density, then
    /// symbol density, then rounded up.
    pub fn estimate(&self, text: &str) -> u64 {
        let mut chars = 0usize;
        let mut whitespace = 0usize;
        let mut symbols = 0usize;
        for c in text.chars() {
            chars += 1;
            if c.is_whitespace() {
                whitespace += 1;
            } else if c.is_ascii_punctuation() {
                symbols += 1;
            }
        }

        if chars == 0 {
            return 0;
        }

        let flat = chars as f64 / self.config.chars_per_token;
        if chars > self.config.large_content_chars {
            return flat.ceil() as u64;
        }

        let whitespace_ratio = whitespace as f64 / chars as f64;
        let non_whitespace = chars - whitespace;
        let symbol_ratio = if non_whitespace == 0 {
            0.0
        } else {
            symbols as f64 / non_whitespace as f64
        };

        let corrected = flat
            * band_multiplier(&self.config.whitespace_bands, whitespace_ratio)
            * band_multiplier(&self.config.symbol_bands, symbol_ratio);
        corrected.ceil() as u64
    }

    /// Estimate tokens for content of a known size whose text has not been
    /// read. Only the flat ratio applies: without the content there is no
    /// density to measure.
    pub fn estimate_size(&self, byte_size: u64) -> u64 {
        if byte_size == 0 {
            return 0;
        }
        (byte_size as f64 / self.config.chars_per_token).ceil() as u64
    }
}

/// Find the multiplier for a measured ratio: the matching band with the
/// highest `min_ratio`, independent of list order since bands come from
/// user-supplied configuration. Below the lowest band the multiplier is 1.0.
fn band_multiplier(bands: &[DensityBand], ratio: f64) -> f64 {
    bands
        .iter()
        .filter(|band| ratio >= band.min_ratio)
        .max_by(|a, b| a.min_ratio.total_cmp(&b.min_ratio))
        .map(|band| band.multiplier)
        .unwrap_or(1.0)
}
