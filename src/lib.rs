//! ctxpack bundles a repository's files for LLM context windows under a
//! user-imposed budget.
//!
//! The core is a budget-constrained file selection engine: candidates flow
//! through an ordering strategy, get token/cost estimates, and are cut by a
//! single greedy pass against normalized ceilings. Budgets may be expressed
//! in tokens, USD, or EUR; results are reported back in the unit the caller
//! budgeted in.
//!
//! # Example
//!
//! ```ignore
//! use ctxpack::config::EngineConfig;
//! use ctxpack::budget::BudgetSpec;
//! use ctxpack::select::{SelectionEngine, SizeDescending};
//!
//! let config = EngineConfig::load(None)?;
//! let engine = SelectionEngine::from_config(&config);
//! let candidates = ctxpack::scan::scan_candidates(".".as_ref())?;
//!
//! let spec = BudgetSpec::usd(0.25, "claude-haiku");
//! let result = engine.select(&candidates, &spec, &SizeDescending).await?;
//! println!("{}", result.format());
//! ```

pub mod budget;
pub mod config;
pub mod provider;
pub mod render;
pub mod scan;
pub mod select;

pub use budget::{BudgetError, BudgetKind, BudgetSpec, TokenEstimator};
pub use provider::{CostEstimate, Provider, ProviderRegistry};
pub use select::{CandidateFile, EstimatedFile, SelectionEngine, SelectionResult};
