//! CLI argument parsing for the research pipeline.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{BillingConfig, GeoMode, RunConfig};

/// Market Research Pipeline CLI Arguments
#[derive(Parser, Debug, Clone)]
#[command(
    name = "market-research",
    about = "Sequential multi-agent market research: vertical -> geo -> segments -> positioning -> company fit -> ranking"
)]
pub struct Args {
    /// Target IoT vertical (falls back to VERTICAL env var)
    #[arg(short, long)]
    pub vertical: Option<String>,

    /// Target region, or ALL/Global for multi-geography mode (REGION env var)
    #[arg(short, long)]
    pub region: Option<String>,

    /// System architecture hint for positioning (SYSTEM_ARCHITECTURE env var)
    #[arg(short = 'a', long)]
    pub architecture: Option<String>,

    /// Geography mode: single or multi
    #[arg(long, value_enum, default_value = "single")]
    pub geo_mode: GeoModeArg,

    /// Root directory of retrieval documents (MARKET_DOCS_DIR env var)
    #[arg(short = 'd', long)]
    pub docs_dir: Option<PathBuf>,

    /// Disable retrieval context entirely
    #[arg(long)]
    pub no_retrieval: bool,

    /// Directory for reports and exported tables
    #[arg(short, long, default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Cost ceiling override in currency units (COST_CEILING env var)
    #[arg(long)]
    pub budget: Option<f64>,

    /// Run a single prompt instead of the interactive loop
    #[arg(short, long)]
    pub prompt: Option<String>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoModeArg {
    Single,
    Multi,
}

impl From<GeoModeArg> for GeoMode {
    fn from(arg: GeoModeArg) -> Self {
        match arg {
            GeoModeArg::Single => GeoMode::Single,
            GeoModeArg::Multi => GeoMode::Multi,
        }
    }
}

impl Args {
    /// Resolve the run configuration: CLI flags win, then env vars, then
    /// defaults.
    pub fn run_config(&self) -> RunConfig {
        let defaults = RunConfig::default();
        RunConfig {
            vertical: self
                .vertical
                .clone()
                .or_else(|| env_nonempty("VERTICAL"))
                .unwrap_or(defaults.vertical),
            region: self
                .region
                .clone()
                .or_else(|| env_nonempty("REGION"))
                .unwrap_or(defaults.region),
            architecture: self
                .architecture
                .clone()
                .or_else(|| env_nonempty("SYSTEM_ARCHITECTURE")),
            geo_mode: self.geo_mode.into(),
            doc_root: self
                .docs_dir
                .clone()
                .or_else(|| env_nonempty("MARKET_DOCS_DIR").map(PathBuf::from))
                .unwrap_or(defaults.doc_root),
            retrieval_enabled: !self.no_retrieval
                && env_nonempty("RETRIEVAL_DISABLED").is_none(),
            output_dir: self.output_dir.clone(),
        }
    }

    /// Billing settings from env, with the CLI budget override applied.
    pub fn billing_config(&self) -> BillingConfig {
        let mut billing = BillingConfig::from_env();
        if let Some(budget) = self.budget {
            billing.cost_ceiling = budget;
        }
        billing
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
