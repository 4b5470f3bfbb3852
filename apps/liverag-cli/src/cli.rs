use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "liverag", version, about = "Hybrid retrieval question answering")]
pub struct Cli {
    /// Directory holding config.toml and the per-environment overlays.
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Answer a single question.
    Ask(AskArgs),
    /// Answer every question in a JSONL file.
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
pub struct AskArgs {
    pub question: String,

    #[arg(long)]
    pub id: Option<String>,

    /// Documents kept after reranking.
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Per-source retrieval depth and RRF constant.
    #[arg(long)]
    pub rrf_k: Option<usize>,

    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    /// Only process the first N records.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Queries in flight at once.
    #[arg(long)]
    pub concurrency: Option<usize>,
}
