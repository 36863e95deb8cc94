pub mod list;
pub mod run;
pub mod schema;
pub mod watch;

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "phoenix-runner")]
#[command(
    author,
    version,
    about = "Priority-ordered, concurrent test orchestrator for multi-project repositories"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logs and live subprocess output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the full error chain on fatal errors
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover, schedule and run tests, then report
    Run(RunArgs),

    /// Re-run incrementally whenever files change
    Watch(RunArgs),

    /// Print the project and test-type registries
    List(ListArgs),

    /// Print JSON Schema for the config file
    Schema,
}

#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    /// Projects to test (comma-separated keys, default: all)
    #[arg(long, value_delimiter = ',')]
    pub projects: Option<Vec<String>>,

    /// Test types to run (comma-separated keys, default: all)
    #[arg(long, value_delimiter = ',')]
    pub types: Option<Vec<String>>,

    /// Run parallel-capable tasks concurrently (default)
    #[arg(long, overrides_with = "no_parallel")]
    pub parallel: bool,

    /// Run every task one at a time
    #[arg(long, overrides_with = "parallel")]
    pub no_parallel: bool,

    /// Retries per task after the first attempt
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub retries: Option<u32>,

    /// Maximum tasks running at once
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=64))]
    pub concurrency: Option<u64>,

    /// Run the coverage command instead of the test command
    #[arg(long)]
    pub coverage: bool,

    /// Only test projects touched since the base branch
    #[arg(long)]
    pub incremental: bool,

    /// Stop dispatching after the first failed task
    #[arg(long)]
    pub fail_fast: bool,

    /// Path to config file (default: phoenix-runner.yaml under --root, if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Repository root that project directories are relative to
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Base ref for --incremental
    #[arg(long)]
    pub base: Option<String>,

    /// Summary format written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Override report directory
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Do not persist the JSON report
    #[arg(long)]
    pub no_report: bool,
}

#[derive(Parser, Clone, Debug)]
pub struct ListArgs {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Repository root holding the default config file
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,
}
