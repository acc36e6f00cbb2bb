use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "thesis-structure",
    version,
    about = "Thesis structure analysis: scoring, cross-references and recommendations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Plain-text thesis document.
    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub document_id: String,

    /// JSON section tree; skips the structure extractor when given.
    #[arg(long)]
    pub tree: Option<PathBuf>,

    /// JSON array of `{id, title?, content?}` citation records.
    #[arg(long)]
    pub citations: Option<PathBuf>,

    /// Program that turns a prompt on stdin into a structure outline.
    #[arg(long)]
    pub extractor_cmd: Option<String>,

    /// Program that turns a prompt on stdin into recommendations.
    #[arg(long)]
    pub advisor_cmd: Option<String>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[arg(long)]
    pub max_sections: Option<usize>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Print the report as JSON on stdout.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/thesis-structure/reports.sqlite")]
    pub db_path: PathBuf,
}
