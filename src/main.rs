//! ctxpack command-line interface.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ctxpack::budget::{BudgetKind, BudgetSpec};
use ctxpack::config::EngineConfig;
use ctxpack::render::render_markdown;
use ctxpack::scan::scan_candidates;
use ctxpack::select::{
    ExtensionPriority, OrderingStrategy, ScanOrder, SelectionEngine, SizeDescending,
};

/// Which built-in ordering strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrderingKind {
    /// Largest files first (default).
    Size,
    /// Original scan order.
    Scan,
    /// --ext-priority extensions first, remainder by size.
    Ext,
}

#[derive(Debug, Parser)]
#[command(
    name = "ctxpack",
    version,
    about = "Bundle repository files for LLM context windows under a budget"
)]
#[command(group(
    ArgGroup::new("budget")
        .required(true)
        .args(["max_tokens", "max_usd", "max_eur"]),
))]
struct Cli {
    /// Directory to scan for candidate files.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Budget as a maximum token count.
    #[arg(long)]
    max_tokens: Option<u64>,

    /// Budget as a maximum spend in USD (requires --provider).
    #[arg(long)]
    max_usd: Option<f64>,

    /// Budget as a maximum spend in EUR (requires --provider).
    #[arg(long)]
    max_eur: Option<f64>,

    /// Provider id for pricing (e.g. claude-haiku).
    #[arg(long)]
    provider: Option<String>,

    /// Ordering strategy for the greedy pass.
    #[arg(long, value_enum, default_value_t = OrderingKind::Size)]
    order: OrderingKind,

    /// Comma-separated extension priority list for --order ext.
    #[arg(long, value_delimiter = ',')]
    ext_priority: Vec<String>,

    /// Path to a TOML config file (providers, estimator constants, EUR rate).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the rendered markdown bundle to this path.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the selection result as JSON instead of a summary.
    #[arg(long)]
    json: bool,

    /// Show the selection's cost on every configured provider.
    #[arg(long)]
    compare: bool,
}

impl Cli {
    fn budget_spec(&self) -> BudgetSpec {
        if let Some(tokens) = self.max_tokens {
            let mut spec = BudgetSpec::tokens(tokens);
            spec.provider_id = self.provider.clone();
            spec
        } else if let Some(usd) = self.max_usd {
            BudgetSpec {
                kind: BudgetKind::Usd,
                limit: usd,
                provider_id: self.provider.clone(),
            }
        } else {
            BudgetSpec {
                kind: BudgetKind::Eur,
                limit: self.max_eur.unwrap_or_default(),
                provider_id: self.provider.clone(),
            }
        }
    }

    fn ordering(&self) -> Box<dyn OrderingStrategy> {
        match self.order {
            OrderingKind::Size => Box::new(SizeDescending),
            OrderingKind::Scan => Box::new(ScanOrder),
            OrderingKind::Ext => Box::new(ExtensionPriority::new(self.ext_priority.clone())),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.as_deref())?;
    let engine = SelectionEngine::from_config(&config);

    let candidates = scan_candidates(&cli.path)
        .with_context(|| format!("scanning {}", cli.path.display()))?;
    info!(count = candidates.len(), "candidates scanned");

    let spec = cli.budget_spec();
    let ordering = cli.ordering();
    let result = engine.select(&candidates, &spec, ordering.as_ref()).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.format());
    }

    if cli.compare {
        println!("## Cost by provider\n");
        for (provider, estimate) in engine
            .registry()
            .cost_report(result.total_tokens, engine.registry().ids())
        {
            let fit = if estimate.within_context_window {
                "fits"
            } else {
                "exceeds window"
            };
            println!(
                "- {}: ${:.4} ({:.1}% of context, {})",
                provider.display_name,
                estimate.input_cost_usd,
                estimate.utilization_percent,
                fit
            );
        }
        println!();
    }

    if let Some(output) = &cli.output {
        let bundle = render_markdown(&result.selected)
            .with_context(|| format!("rendering bundle to {}", output.display()))?;
        // Same estimator as selection, run against the final rendered text.
        let bundle_tokens = engine.estimator().estimate(&bundle);
        fs::write(output, &bundle)
            .with_context(|| format!("writing {}", output.display()))?;
        println!(
            "Wrote {} ({} bytes, ~{} tokens)",
            output.display(),
            bundle.len(),
            bundle_tokens
        );
    }

    Ok(())
}
