//! Budget-constrained file selection.
//!
//! The engine runs a single logical pass: ordering middleware, per-candidate
//! estimation, a greedy cut against the normalized ceilings, and result
//! assembly back into the caller's budget unit. Everything is in-memory and
//! deterministic; the one suspension point is the ordering middleware call,
//! awaited exactly once per invocation.

mod ordering;
mod selector;

pub use ordering::{
    ExtensionPriority, OrderingContext, OrderingFn, OrderingStrategy, ScanOrder, SizeDescending,
};
pub use selector::{CandidateFile, EstimatedFile, SelectionResult};

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::budget::{BudgetError, BudgetSpec, TokenEstimator};
use crate::config::EngineConfig;
use crate::provider::ProviderRegistry;

use selector::{assemble, greedy_partition};

/// The selection engine: registry, estimator, and the fixed EUR rate,
/// threaded into every call. Holds no per-run state.
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    registry: ProviderRegistry,
    estimator: TokenEstimator,
    eur_usd_rate: f64,
}

impl SelectionEngine {
    /// Create an engine from its parts.
    pub fn new(registry: ProviderRegistry, estimator: TokenEstimator, eur_usd_rate: f64) -> Self {
        Self {
            registry,
            estimator,
            eur_usd_rate,
        }
    }

    /// Create an engine from loaded configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            registry: ProviderRegistry::new(config.providers.clone()),
            estimator: TokenEstimator::new(config.estimator.clone()),
            eur_usd_rate: config.eur_usd_rate,
        }
    }

    /// The provider registry in use.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The token estimator in use. The renderer must reuse this so both
    /// call sites agree on counts.
    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    /// Select the subset of `candidates` that fits `spec`, using `ordering`
    /// to decide the order of the greedy pass.
    ///
    /// The result partitions the input exactly: every candidate lands in
    /// either `selected` or `excluded`, including candidates the ordering
    /// strategy filtered out (those are excluded in original scan order).
    pub async fn select(
        &self,
        candidates: &[CandidateFile],
        spec: &BudgetSpec,
        ordering: &dyn OrderingStrategy,
    ) -> Result<SelectionResult, BudgetError> {
        let ceilings = spec.normalize(&self.registry, self.eur_usd_rate)?;
        debug!(
            token_ceiling = ceilings.token_ceiling,
            cost_ceiling_usd = ceilings.cost_ceiling_usd,
            kind = %spec.kind,
            "normalized budget"
        );

        let ctx = OrderingContext {
            token_ceiling: ceilings.token_ceiling,
            cost_ceiling_usd: ceilings.cost_ceiling_usd,
        };
        let ordered = ordering.order(candidates.to_vec(), spec, &ctx).await;
        let ordered = sanitize_ordering(candidates, ordered);

        let input_rate = spec
            .provider_id
            .as_deref()
            .and_then(|id| self.registry.get(id))
            .map(|p| p.input_cost_per_million)
            .unwrap_or(0.0);

        let kept: HashSet<PathBuf> = ordered.iter().map(|c| c.path.clone()).collect();
        let estimated: Vec<EstimatedFile> = ordered
            .into_iter()
            .map(|file| self.estimate_candidate(file, input_rate))
            .collect();

        let (selected, mut excluded) = greedy_partition(estimated, ceilings);

        // Candidates the middleware filtered out still belong to the result
        // partition; they are excluded in original scan order.
        for candidate in candidates {
            if !kept.contains(&candidate.path) {
                excluded.push(self.estimate_candidate(candidate.clone(), input_rate));
            }
        }

        let result = assemble(selected, excluded, spec, self.eur_usd_rate);
        info!(
            selected = result.selected.len(),
            excluded = result.excluded.len(),
            total_tokens = result.total_tokens,
            utilization = format!("{:.1}%", result.utilization_percent),
            "selection complete"
        );
        Ok(result)
    }

    fn estimate_candidate(&self, file: CandidateFile, input_rate: f64) -> EstimatedFile {
        let estimated_tokens = self.estimator.estimate_size(file.byte_size);
        EstimatedFile {
            file,
            estimated_tokens,
            estimated_cost_usd: estimated_tokens as f64 / 1_000_000.0 * input_rate,
        }
    }
}

/// Keep the ordering output honest: drop entries the middleware fabricated
/// and collapse duplicates to their first occurrence.
fn sanitize_ordering(input: &[CandidateFile], ordered: Vec<CandidateFile>) -> Vec<CandidateFile> {
    let known: HashSet<&PathBuf> = input.iter().map(|c| &c.path).collect();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    ordered
        .into_iter()
        .filter(|c| known.contains(&c.path) && seen.insert(c.path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::EstimatorConfig;
    use crate::provider::Provider;

    fn haiku_registry() -> ProviderRegistry {
        ProviderRegistry::new(vec![Provider {
            id: "claude-haiku".to_string(),
            display_name: "Claude Haiku".to_string(),
            context_window: 200_000,
            input_cost_per_million: 0.80,
            output_cost_per_million: 4.00,
        }])
    }

    fn engine() -> SelectionEngine {
        SelectionEngine::new(
            haiku_registry(),
            TokenEstimator::new(EstimatorConfig::default()),
            1.08,
        )
    }

    fn uniform_candidates(count: usize, byte_size: u64) -> Vec<CandidateFile> {
        (0..count)
            .map(|i| CandidateFile::new(format!("src/f{i}.rs"), byte_size, "rs"))
            .collect()
    }

    #[tokio::test]
    async fn test_token_budget_selects_greedily() {
        // Ten files of 1000 estimated tokens each against a 5500 ceiling.
        let candidates = uniform_candidates(10, 4000);
        let spec = BudgetSpec::tokens(5500);
        let result = engine()
            .select(&candidates, &spec, &SizeDescending)
            .await
            .unwrap();

        assert_eq!(result.selected.len(), 5);
        assert_eq!(result.excluded.len(), 5);
        assert_eq!(result.total_tokens, 5000);
        assert!((result.utilization_percent - 90.909).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_usd_budget_binds_tokens() {
        // $0.01 at $0.80/M is a 12,500-token ceiling: three 4000-token files
        // fit, the fourth does not.
        let candidates = uniform_candidates(4, 16_000);
        let spec = BudgetSpec::usd(0.01, "claude-haiku");
        let result = engine()
            .select(&candidates, &spec, &ScanOrder)
            .await
            .unwrap();

        assert_eq!(result.selected.len(), 3);
        assert_eq!(result.total_tokens, 12_000);
        assert!(result.total_cost_usd <= 0.01);
    }

    #[tokio::test]
    async fn test_unknown_provider_currency_budget_fails() {
        let candidates = uniform_candidates(2, 1000);
        let spec = BudgetSpec::eur(10.0, "unknown-provider");
        let err = engine()
            .select(&candidates, &spec, &SizeDescending)
            .await
            .unwrap_err();
        assert!(matches!(err, BudgetError::UnknownProvider { .. }));
    }

    #[tokio::test]
    async fn test_filtered_candidates_land_in_excluded() {
        let candidates = uniform_candidates(4, 1000);
        // Middleware that drops everything but the first candidate.
        let only_first = OrderingFn(
            |mut c: Vec<CandidateFile>, _: &BudgetSpec, _: &OrderingContext| {
                c.truncate(1);
                c
            },
        );
        let spec = BudgetSpec::tokens(100_000);
        let result = engine()
            .select(&candidates, &spec, &only_first)
            .await
            .unwrap();

        assert_eq!(result.selected.len(), 1);
        assert_eq!(result.excluded.len(), 3);
        assert_eq!(result.selected.len() + result.excluded.len(), candidates.len());
    }

    #[tokio::test]
    async fn test_fabricated_candidates_dropped() {
        let candidates = uniform_candidates(2, 1000);
        let fabricate = OrderingFn(
            |mut c: Vec<CandidateFile>, _: &BudgetSpec, _: &OrderingContext| {
                c.push(CandidateFile::new("not/scanned.rs", 10, "rs"));
                c
            },
        );
        let spec = BudgetSpec::tokens(100_000);
        let result = engine()
            .select(&candidates, &spec, &fabricate)
            .await
            .unwrap();

        assert_eq!(result.selected.len() + result.excluded.len(), 2);
        assert!(result
            .selected
            .iter()
            .all(|f| f.file.path != PathBuf::from("not/scanned.rs")));
    }

    #[tokio::test]
    async fn test_oversized_then_small_in_scan_order() {
        let candidates = vec![
            CandidateFile::new("huge.rs", 100_000, "rs"),
            CandidateFile::new("a.rs", 400, "rs"),
            CandidateFile::new("b.rs", 400, "rs"),
        ];
        let spec = BudgetSpec::tokens(500);
        let result = engine()
            .select(&candidates, &spec, &ScanOrder)
            .await
            .unwrap();

        let selected: Vec<_> = result.selected.iter().map(|f| f.file.path.clone()).collect();
        assert_eq!(selected, vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")]);
        assert_eq!(result.excluded[0].file.path, PathBuf::from("huge.rs"));
    }

    #[tokio::test]
    async fn test_estimates_recomputed_per_call() {
        let candidates = uniform_candidates(3, 4000);
        let spec = BudgetSpec::tokens(100_000);
        let engine = engine();
        let first = engine
            .select(&candidates, &spec, &SizeDescending)
            .await
            .unwrap();
        let second = engine
            .select(&candidates, &spec, &SizeDescending)
            .await
            .unwrap();
        assert_eq!(first.total_tokens, second.total_tokens);
        assert_eq!(first.used, second.used);
    }
}
