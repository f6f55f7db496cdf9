//! Candidate records, the greedy pass, and result assembly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::budget::{BudgetKind, BudgetSpec, Ceilings};

/// A file eligible for selection, as supplied by the scanning layer.
///
/// Content is never read at this stage; sizing is byte-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    /// Path identity, as produced by the scanner.
    pub path: PathBuf,
    /// Size on disk in bytes.
    pub byte_size: u64,
    /// Lowercased extension without the leading dot, or empty.
    pub extension: String,
}

impl CandidateFile {
    /// Create a new candidate record.
    pub fn new(path: impl Into<PathBuf>, byte_size: u64, extension: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            byte_size,
            extension: extension.into(),
        }
    }
}

/// A candidate annotated with derived estimates. Recomputed on every engine
/// call, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimatedFile {
    /// The underlying candidate.
    #[serde(flatten)]
    pub file: CandidateFile,
    /// Approximate token count derived from byte size.
    pub estimated_tokens: u64,
    /// Approximate input cost in USD (0 when no provider prices the run).
    pub estimated_cost_usd: f64,
}

/// Outcome of a selection run.
///
/// `selected` and `excluded` together are an exact partition of the input
/// candidate set. `used`, `remaining`, and `utilization_percent` are
/// expressed in the unit the caller budgeted in, never in the internal
/// ceiling unit.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResult {
    /// Files that fit the budget, in selection order.
    pub selected: Vec<EstimatedFile>,
    /// Files that did not fit (or were filtered out by ordering), in order.
    pub excluded: Vec<EstimatedFile>,
    /// Total estimated tokens across `selected`.
    pub total_tokens: u64,
    /// Total estimated input cost across `selected`, in USD.
    pub total_cost_usd: f64,
    /// Unit the caller budgeted in.
    pub budget_kind: BudgetKind,
    /// The caller's limit, in that unit.
    pub budget_limit: f64,
    /// Budget consumed, in the caller's unit.
    pub used: f64,
    /// Budget left over, in the caller's unit.
    pub remaining: f64,
    /// Percentage of the budget consumed.
    pub utilization_percent: f64,
}

impl SelectionResult {
    /// Format as a human-readable summary.
    pub fn format(&self) -> String {
        let mut output = String::from("## Selection Summary\n\n");

        output.push_str(&format!(
            "**Files**: {} selected, {} excluded\n",
            self.selected.len(),
            self.excluded.len()
        ));
        output.push_str(&format!("**Tokens**: {}\n", self.total_tokens));
        output.push_str(&format!("**Cost**: ${:.4}\n", self.total_cost_usd));

        let unit = match self.budget_kind {
            BudgetKind::Tokens => "tokens",
            BudgetKind::Usd => "USD",
            BudgetKind::Eur => "EUR",
        };
        output.push_str(&format!(
            "**Budget**: {:.4}/{:.4} {} ({:.1}%)\n",
            self.used, self.budget_limit, unit, self.utilization_percent
        ));

        output
    }
}

/// Single-pass greedy selection over an already-ordered candidate list.
///
/// A candidate is included iff both running totals stay within the ceilings
/// simultaneously; otherwise it is excluded and the pass continues. No
/// backtracking and no reordering: "why was file X excluded" must stay
/// answerable from the ordered list alone. An oversized first candidate is
/// excluded alone while later, smaller candidates may still land.
pub(crate) fn greedy_partition(
    estimated: Vec<EstimatedFile>,
    ceilings: Ceilings,
) -> (Vec<EstimatedFile>, Vec<EstimatedFile>) {
    let mut selected = Vec::new();
    let mut excluded = Vec::new();
    let mut running_tokens = 0u64;
    let mut running_cost = 0.0f64;

    for file in estimated {
        let fits_tokens = running_tokens
            .checked_add(file.estimated_tokens)
            .map(|total| total <= ceilings.token_ceiling)
            .unwrap_or(false);
        let fits_cost = running_cost + file.estimated_cost_usd <= ceilings.cost_ceiling_usd;

        if fits_tokens && fits_cost {
            running_tokens += file.estimated_tokens;
            running_cost += file.estimated_cost_usd;
            selected.push(file);
        } else {
            excluded.push(file);
        }
    }

    (selected, excluded)
}

/// Aggregate totals and convert utilization back into the caller's unit.
pub(crate) fn assemble(
    selected: Vec<EstimatedFile>,
    excluded: Vec<EstimatedFile>,
    spec: &BudgetSpec,
    eur_usd_rate: f64,
) -> SelectionResult {
    let total_tokens: u64 = selected.iter().map(|f| f.estimated_tokens).sum();
    let total_cost_usd: f64 = selected.iter().map(|f| f.estimated_cost_usd).sum();

    let used = match spec.kind {
        BudgetKind::Tokens => total_tokens as f64,
        BudgetKind::Usd => total_cost_usd,
        BudgetKind::Eur => total_cost_usd / eur_usd_rate,
    };
    let remaining = (spec.limit - used).max(0.0);
    let utilization_percent = if spec.limit > 0.0 {
        used / spec.limit * 100.0
    } else {
        0.0
    };

    SelectionResult {
        selected,
        excluded,
        total_tokens,
        total_cost_usd,
        budget_kind: spec.kind,
        budget_limit: spec.limit,
        used,
        remaining,
        utilization_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimated(path: &str, tokens: u64, cost: f64) -> EstimatedFile {
        EstimatedFile {
            file: CandidateFile::new(path, tokens * 4, "rs"),
            estimated_tokens: tokens,
            estimated_cost_usd: cost,
        }
    }

    fn unlimited_cost(token_ceiling: u64) -> Ceilings {
        Ceilings {
            token_ceiling,
            cost_ceiling_usd: f64::INFINITY,
        }
    }

    #[test]
    fn test_greedy_stops_at_token_ceiling() {
        let files: Vec<_> = (0..10)
            .map(|i| estimated(&format!("f{i}.rs"), 1000, 0.0))
            .collect();
        let (selected, excluded) = greedy_partition(files, unlimited_cost(5500));

        assert_eq!(selected.len(), 5);
        assert_eq!(excluded.len(), 5);
        let total: u64 = selected.iter().map(|f| f.estimated_tokens).sum();
        assert_eq!(total, 5000);
    }

    #[test]
    fn test_oversized_first_candidate_excluded_alone() {
        let files = vec![
            estimated("huge.rs", 10_000, 0.0),
            estimated("a.rs", 300, 0.0),
            estimated("b.rs", 400, 0.0),
        ];
        let (selected, excluded) = greedy_partition(files, unlimited_cost(1000));

        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].file.path, PathBuf::from("huge.rs"));
        // The two small files still fit, in the order they arrived.
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].file.path, PathBuf::from("a.rs"));
        assert_eq!(selected[1].file.path, PathBuf::from("b.rs"));
    }

    #[test]
    fn test_both_ceilings_must_hold() {
        let files = vec![estimated("a.rs", 100, 5.0), estimated("b.rs", 100, 0.5)];
        let ceilings = Ceilings {
            token_ceiling: 10_000,
            cost_ceiling_usd: 1.0,
        };
        let (selected, excluded) = greedy_partition(files, ceilings);

        // First file fits the token ceiling but not the cost ceiling.
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].file.path, PathBuf::from("b.rs"));
        assert_eq!(excluded.len(), 1);
    }

    #[test]
    fn test_partition_is_exact() {
        let files: Vec<_> = (0..20)
            .map(|i| estimated(&format!("f{i}.rs"), (i % 7) * 100 + 50, 0.0))
            .collect();
        let count = files.len();
        let (selected, excluded) = greedy_partition(files, unlimited_cost(900));
        assert_eq!(selected.len() + excluded.len(), count);
    }

    #[test]
    fn test_assemble_token_budget_units() {
        let selected = vec![estimated("a.rs", 5000, 0.0)];
        let spec = BudgetSpec::tokens(5500);
        let result = assemble(selected, vec![], &spec, 1.08);

        assert_eq!(result.total_tokens, 5000);
        assert_eq!(result.used, 5000.0);
        assert_eq!(result.remaining, 500.0);
        assert!((result.utilization_percent - 90.909).abs() < 0.01);
    }

    #[test]
    fn test_assemble_eur_budget_converts_back() {
        // 5.40 USD at a 1.08 rate is 5 EUR used out of 10.
        let selected = vec![estimated("a.rs", 1000, 5.40)];
        let spec = BudgetSpec::eur(10.0, "claude-haiku");
        let result = assemble(selected, vec![], &spec, 1.08);

        assert!((result.used - 5.0).abs() < 1e-9);
        assert!((result.remaining - 5.0).abs() < 1e-9);
        assert!((result.utilization_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_summary() {
        let spec = BudgetSpec::tokens(1000);
        let result = assemble(vec![estimated("a.rs", 900, 0.0)], vec![], &spec, 1.08);
        let summary = result.format();
        assert!(summary.contains("1 selected"));
        assert!(summary.contains("90.0%"));
    }
}
