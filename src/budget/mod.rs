//! Token estimation and budget normalization.
//!
//! A budget arrives from the user in one of three units (tokens, USD, EUR)
//! and is normalized into internal ceilings that bound the greedy selection
//! pass. Token counts themselves are heuristic estimates: we deliberately
//! carry no tokenizer dependency, and the same estimator serves both
//! per-candidate sizing and the rendered bundle.
//!
//! # Example
//!
//! ```ignore
//! use ctxpack::budget::{BudgetSpec, TokenEstimator};
//!
//! let estimator = TokenEstimator::default();
//! let tokens = estimator.estimate("fn main() {}");
//!
//! let spec = BudgetSpec::usd(0.25, "claude-haiku");
//! let ceilings = spec.normalize(&registry, 1.08)?;
//! ```

mod estimator;
mod spec;

pub use estimator::{DensityBand, EstimatorConfig, TokenEstimator};
pub use spec::{BudgetError, BudgetKind, BudgetSpec, Ceilings};
