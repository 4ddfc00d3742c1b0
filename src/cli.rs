use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::metrics::{DEFAULT_RECENCY_HORIZON, DEFAULT_TOP_K};

#[derive(Parser, Debug)]
#[command(
    name = "ragfair",
    version,
    about = "Counterfactual fairness gate for retrieval-augmented generation systems"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Evaluate(EvaluateArgs),
    Probe(ProbeArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InputPaths {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long)]
    pub pairs_path: Option<PathBuf>,

    #[arg(long)]
    pub thresholds_path: Option<PathBuf>,

    #[arg(long)]
    pub authority_weights_path: Option<PathBuf>,

    #[arg(long)]
    pub sensitive_terms_path: Option<PathBuf>,
}

impl InputPaths {
    pub fn pairs(&self) -> PathBuf {
        self.pairs_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("counterfactual_pairs.json"))
    }

    pub fn thresholds(&self) -> PathBuf {
        self.thresholds_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("thresholds.json"))
    }

    pub fn authority_weights(&self) -> PathBuf {
        self.authority_weights_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("authority_weights.json"))
    }

    pub fn sensitive_terms(&self) -> PathBuf {
        self.sensitive_terms_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("sensitive_terms.json"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub inputs: InputPaths,

    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,

    #[arg(long)]
    pub rag_fixtures: Option<PathBuf>,

    #[arg(long)]
    pub active_year: Option<i64>,

    #[arg(long, default_value_t = DEFAULT_RECENCY_HORIZON)]
    pub recency_horizon: i64,

    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    #[arg(long = "pair")]
    pub pair_ids: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub report_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    #[arg(long)]
    pub text_a: String,

    #[arg(long)]
    pub text_b: String,

    #[arg(long)]
    pub sensitive_terms_path: Option<PathBuf>,

    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long, default_value_t = 0.5)]
    pub toxicity_ceiling: f64,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub inputs: InputPaths,

    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,

    #[arg(long, default_value_t = 5)]
    pub recent: usize,
}
