//! Provider pricing profiles and cost estimation.
//!
//! The registry is built once from loaded configuration and threaded by
//! reference into every call. Entries are never mutated at runtime, which
//! keeps the selection engine trivially testable with fake registries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named pricing and context-window profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Stable identifier used in budgets and lookups (e.g. "claude-haiku").
    pub id: String,
    /// Human-readable name for reports.
    pub display_name: String,
    /// Maximum context window in tokens.
    pub context_window: u64,
    /// Cost per one million input tokens, in USD.
    pub input_cost_per_million: f64,
    /// Cost per one million output tokens, in USD.
    pub output_cost_per_million: f64,
}

/// Cost and utilization estimate for a token count against one provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostEstimate {
    /// Input cost in USD.
    pub input_cost_usd: f64,
    /// Whether the token count fits in the provider's context window.
    pub within_context_window: bool,
    /// Token count as a percentage of the context window.
    pub utilization_percent: f64,
}

/// Immutable table of provider profiles, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Provider>,
}

impl ProviderRegistry {
    /// Build a registry from provider entries. Later entries with a duplicate
    /// id replace earlier ones; the config loader rejects duplicates before
    /// this point.
    pub fn new(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
        }
    }

    /// Look up a provider by id.
    pub fn get(&self, id: &str) -> Option<&Provider> {
        self.providers.get(id)
    }

    /// Provider ids in sorted order, for deterministic reports.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Estimate input cost and context utilization for a token count.
    ///
    /// Returns `None` when the provider id is unknown; lookups never fail
    /// hard here. Budget normalization is stricter, see
    /// [`crate::budget::BudgetSpec::normalize`].
    pub fn estimate_cost(&self, tokens: u64, provider_id: &str) -> Option<CostEstimate> {
        let provider = self.get(provider_id)?;
        Some(CostEstimate {
            input_cost_usd: tokens as f64 / 1_000_000.0 * provider.input_cost_per_million,
            within_context_window: tokens <= provider.context_window,
            utilization_percent: if provider.context_window == 0 {
                0.0
            } else {
                tokens as f64 / provider.context_window as f64 * 100.0
            },
        })
    }

    /// Estimate cost across several providers, skipping unknown ids.
    ///
    /// An unknown id drops that row from the report with a warning rather
    /// than failing the whole comparison.
    pub fn cost_report<'a, I>(&self, tokens: u64, ids: I) -> Vec<(&Provider, CostEstimate)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut rows = Vec::new();
        for id in ids {
            match self.estimate_cost(tokens, id) {
                Some(estimate) => {
                    // get() succeeded inside estimate_cost, so this is present.
                    if let Some(provider) = self.get(id) {
                        rows.push((provider, estimate));
                    }
                }
                None => warn!(provider = id, "unknown provider, skipping cost row"),
            }
        }
        rows
    }
}
