//! Pluggable candidate ordering.
//!
//! An ordering strategy is consulted exactly once per selection run, before
//! the greedy pass. It returns a permutation of the candidates it was given,
//! possibly filtered; it must never fabricate new entries. Strategies may
//! suspend (e.g. to consult an external ranking service), which is why the
//! contract is async, but the built-ins are all synchronous.

use async_trait::async_trait;

use super::selector::CandidateFile;
use crate::budget::BudgetSpec;

/// Context handed to an ordering strategy alongside the candidates.
#[derive(Debug, Clone, Copy)]
pub struct OrderingContext {
    /// Normalized token ceiling for this run.
    pub token_ceiling: u64,
    /// Normalized USD cost ceiling for this run.
    pub cost_ceiling_usd: f64,
}

/// Orders (and optionally filters) candidates before the greedy pass.
#[async_trait]
pub trait OrderingStrategy: Send + Sync {
    /// Return the candidates in selection order. The result must be a
    /// subsequence of a permutation of `candidates`; the engine drops
    /// anything else defensively.
    async fn order(
        &self,
        candidates: Vec<CandidateFile>,
        spec: &BudgetSpec,
        ctx: &OrderingContext,
    ) -> Vec<CandidateFile>;
}

/// Default strategy: largest candidates first.
///
/// A heuristic proxy for "most substantial content first" when the budget is
/// tight. The sort is stable, so equal sizes keep their scan order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeDescending;

#[async_trait]
impl OrderingStrategy for SizeDescending {
    async fn order(
        &self,
        mut candidates: Vec<CandidateFile>,
        _spec: &BudgetSpec,
        _ctx: &OrderingContext,
    ) -> Vec<CandidateFile> {
        candidates.sort_by(|a, b| b.byte_size.cmp(&a.byte_size));
        candidates
    }
}

/// Preserves the original scan order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOrder;

#[async_trait]
impl OrderingStrategy for ScanOrder {
    async fn order(
        &self,
        candidates: Vec<CandidateFile>,
        _spec: &BudgetSpec,
        _ctx: &OrderingContext,
    ) -> Vec<CandidateFile> {
        candidates
    }
}

/// Orders listed extensions first, by their position in the priority list.
/// Everything else falls back to size-descending after the prioritized
/// extensions.
#[derive(Debug, Clone, Default)]
pub struct ExtensionPriority {
    priority: Vec<String>,
}

impl ExtensionPriority {
    /// Create from an ordered extension list (lowercase, no leading dot).
    pub fn new(priority: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            priority: priority
                .into_iter()
                .map(|ext| ext.into().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    fn rank(&self, candidate: &CandidateFile) -> usize {
        self.priority
            .iter()
            .position(|ext| *ext == candidate.extension)
            .unwrap_or(self.priority.len())
    }
}

#[async_trait]
impl OrderingStrategy for ExtensionPriority {
    async fn order(
        &self,
        mut candidates: Vec<CandidateFile>,
        _spec: &BudgetSpec,
        _ctx: &OrderingContext,
    ) -> Vec<CandidateFile> {
        candidates.sort_by(|a, b| {
            self.rank(a)
                .cmp(&self.rank(b))
                .then_with(|| b.byte_size.cmp(&a.byte_size))
        });
        candidates
    }
}

/// Adapter turning a plain function into an ordering strategy. The caller
/// extension point for custom orderings that do not need to suspend.
pub struct OrderingFn<F>(pub F);

#[async_trait]
impl<F> OrderingStrategy for OrderingFn<F>
where
    F: Fn(Vec<CandidateFile>, &BudgetSpec, &OrderingContext) -> Vec<CandidateFile> + Send + Sync,
{
    async fn order(
        &self,
        candidates: Vec<CandidateFile>,
        spec: &BudgetSpec,
        ctx: &OrderingContext,
    ) -> Vec<CandidateFile> {
        (self.0)(candidates, spec, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<CandidateFile> {
        vec![
            CandidateFile::new("readme.md", 100, "md"),
            CandidateFile::new("lib.rs", 400, "rs"),
            CandidateFile::new("notes.txt", 400, "txt"),
            CandidateFile::new("main.rs", 200, "rs"),
        ]
    }

    fn ctx() -> OrderingContext {
        OrderingContext {
            token_ceiling: u64::MAX,
            cost_ceiling_usd: f64::INFINITY,
        }
    }

    fn spec() -> BudgetSpec {
        BudgetSpec::tokens(1000)
    }

    #[tokio::test]
    async fn test_size_descending_stable_on_ties() {
        let ordered = SizeDescending.order(candidates(), &spec(), &ctx()).await;
        let paths: Vec<_> = ordered.iter().map(|c| c.path.to_string_lossy().to_string()).collect();
        // lib.rs and notes.txt tie at 400 bytes and keep their input order.
        assert_eq!(paths, vec!["lib.rs", "notes.txt", "main.rs", "readme.md"]);
    }

    #[tokio::test]
    async fn test_scan_order_is_identity() {
        let input = candidates();
        let ordered = ScanOrder.order(input.clone(), &spec(), &ctx()).await;
        assert_eq!(ordered, input);
    }

    #[tokio::test]
    async fn test_extension_priority() {
        let strategy = ExtensionPriority::new(["md", "rs"]);
        let ordered = strategy.order(candidates(), &spec(), &ctx()).await;
        let paths: Vec<_> = ordered.iter().map(|c| c.path.to_string_lossy().to_string()).collect();
        // md first, then rs by size descending, then the remainder.
        assert_eq!(paths, vec!["readme.md", "lib.rs", "main.rs", "notes.txt"]);
    }

    #[tokio::test]
    async fn test_extension_priority_normalizes_dots_and_case() {
        let strategy = ExtensionPriority::new([".MD"]);
        let ordered = strategy.order(candidates(), &spec(), &ctx()).await;
        assert_eq!(ordered[0].extension, "md");
    }

    #[tokio::test]
    async fn test_ordering_fn_adapter() {
        let reverse = OrderingFn(|mut c: Vec<CandidateFile>, _: &BudgetSpec, _: &OrderingContext| {
            c.reverse();
            c
        });
        let ordered = reverse.order(candidates(), &spec(), &ctx()).await;
        assert_eq!(ordered[0].path, std::path::PathBuf::from("main.rs"));
    }
}
