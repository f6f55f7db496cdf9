//! Budget specification and normalization.
//!
//! A user budget arrives in one of three units (tokens, USD, EUR). Before
//! selection it is normalized into a pair of internal ceilings: a token
//! ceiling and a USD cost ceiling. Whichever unit was requested, both
//! ceilings bound the greedy pass.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::ProviderRegistry;

/// Unit a budget limit is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
    /// Limit is a token count.
    Tokens,
    /// Limit is US dollars against a provider's input pricing.
    Usd,
    /// Limit is euros, converted to USD at the configured fixed rate.
    Eur,
}

impl fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetKind::Tokens => write!(f, "tokens"),
            BudgetKind::Usd => write!(f, "usd"),
            BudgetKind::Eur => write!(f, "eur"),
        }
    }
}

/// Errors raised while validating or normalizing a budget.
///
/// These are fatal and synchronous: a run with a broken budget produces no
/// partial result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BudgetError {
    /// Budget limit was zero or negative.
    #[error("budget limit must be positive, got {0}")]
    NonPositiveLimit(f64),

    /// A currency budget was given without a provider id.
    #[error("{kind} budget requires a provider id for pricing")]
    MissingProvider {
        /// The offending budget kind.
        kind: BudgetKind,
    },

    /// A currency budget named a provider absent from the registry.
    #[error("{kind} budget names unknown provider \"{provider_id}\"")]
    UnknownProvider {
        /// The offending budget kind.
        kind: BudgetKind,
        /// The id that failed to resolve.
        provider_id: String,
    },
}

/// A caller-specified budget: unit, limit, and optional pricing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSpec {
    /// Unit of the limit.
    pub kind: BudgetKind,
    /// Positive limit in the given unit.
    pub limit: f64,
    /// Pricing provider. Required for currency kinds, optional for tokens
    /// (where it only feeds the secondary cost ceiling).
    pub provider_id: Option<String>,
}

/// Internal normalized ceilings bounding the greedy pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ceilings {
    /// Maximum total estimated tokens.
    pub token_ceiling: u64,
    /// Maximum total estimated input cost in USD. Infinite when pricing is
    /// unknown for a token budget.
    pub cost_ceiling_usd: f64,
}

impl BudgetSpec {
    /// Create a token budget.
    pub fn tokens(limit: u64) -> Self {
        Self {
            kind: BudgetKind::Tokens,
            limit: limit as f64,
            provider_id: None,
        }
    }

    /// Create a USD budget against a provider's pricing.
    pub fn usd(limit: f64, provider_id: impl Into<String>) -> Self {
        Self {
            kind: BudgetKind::Usd,
            limit,
            provider_id: Some(provider_id.into()),
        }
    }

    /// Create a EUR budget against a provider's pricing.
    pub fn eur(limit: f64, provider_id: impl Into<String>) -> Self {
        Self {
            kind: BudgetKind::Eur,
            limit,
            provider_id: Some(provider_id.into()),
        }
    }

    /// Attach a provider id to a token budget for the secondary cost ceiling.
    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// Check structural invariants: positive limit, provider present for
    /// currency kinds.
    pub fn validate(&self) -> Result<(), BudgetError> {
        if !(self.limit > 0.0) {
            return Err(BudgetError::NonPositiveLimit(self.limit));
        }
        if self.kind != BudgetKind::Tokens && self.provider_id.is_none() {
            return Err(BudgetError::MissingProvider { kind: self.kind });
        }
        Ok(())
    }

    /// Normalize into internal ceilings.
    ///
    /// For a token budget an unresolvable provider degrades gracefully (the
    /// cost ceiling becomes infinite, cost is non-binding). For currency
    /// budgets the provider is load-bearing, so a missing or unknown id is a
    /// hard error. The asymmetry is deliberate.
    pub fn normalize(
        &self,
        registry: &ProviderRegistry,
        eur_usd_rate: f64,
    ) -> Result<Ceilings, BudgetError> {
        self.validate()?;

        match self.kind {
            BudgetKind::Tokens => {
                let token_ceiling = self.limit.floor() as u64;
                let cost_ceiling_usd = self
                    .provider_id
                    .as_deref()
                    .and_then(|id| registry.estimate_cost(token_ceiling, id))
                    .map(|estimate| estimate.input_cost_usd)
                    .unwrap_or(f64::INFINITY);
                Ok(Ceilings {
                    token_ceiling,
                    cost_ceiling_usd,
                })
            }
            BudgetKind::Usd => self.normalize_usd(registry, self.limit),
            BudgetKind::Eur => self.normalize_usd(registry, self.limit * eur_usd_rate),
        }
    }

    fn normalize_usd(
        &self,
        registry: &ProviderRegistry,
        limit_usd: f64,
    ) -> Result<Ceilings, BudgetError> {
        let provider_id = self
            .provider_id
            .as_deref()
            .ok_or(BudgetError::MissingProvider { kind: self.kind })?;
        let provider =
            registry
                .get(provider_id)
                .ok_or_else(|| BudgetError::UnknownProvider {
                    kind: self.kind,
                    provider_id: provider_id.to_string(),
                })?;

        let token_ceiling = if provider.input_cost_per_million > 0.0 {
            (limit_usd / provider.input_cost_per_million * 1_000_000.0).floor() as u64
        } else {
            // Free input pricing: the cost ceiling alone can never bind tokens.
            u64::MAX
        };

        Ok(Ceilings {
            token_ceiling,
            cost_ceiling_usd: limit_usd,
        })
    }
}
