use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod discovery;
mod error;
mod output;
mod parser;
mod runner;
mod watch;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise only show debug logs with --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("phoenix_runner=debug")
        } else {
            EnvFilter::new("phoenix_runner=warn")
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let verbose = cli.verbose;
    let outcome = match cli.command {
        Commands::Run(args) => cli::run::execute(args, verbose).await,
        Commands::Watch(args) => cli::watch::execute(args, verbose).await,
        Commands::List(args) => cli::list::execute(args).map(|_| ExitCode::SUCCESS),
        Commands::Schema => cli::schema::execute().map(|_| ExitCode::SUCCESS),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            if cli.debug {
                eprintln!("Error: {:?}", e);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}
