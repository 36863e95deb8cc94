use crate::cli::RunArgs;
use crate::watch::{ChangeWatcher, Debouncer, WATCH_DEBOUNCE};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::run::{resolve_options, run_pipeline};

pub async fn execute(args: RunArgs, verbose: bool) -> anyhow::Result<ExitCode> {
    let options = resolve_options(&args, verbose)?.for_watch();

    let ignored = options.report_dir.iter().cloned().collect();
    let mut watcher = ChangeWatcher::start(&options.root, ignored)?;
    let mut debouncer = Debouncer::new(WATCH_DEBOUNCE);

    println!(
        "Watching {} for changes (Ctrl+C to stop)",
        options.root.display()
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let deadline = debouncer.deadline();

        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, leaving watch mode");
                break;
            }
            changed = watcher.next() => {
                let Some(path) = changed else {
                    warn!("File watcher stopped");
                    break;
                };
                debug!("Changed: {:?}", path);
                debouncer.on_event(Instant::now());
                debug!("Debounce: {:?}", debouncer.state());
            }
            _ = wait_until(deadline) => {
                if !debouncer.poll(Instant::now()) {
                    continue;
                }
                println!("\nChange detected, running tests...");
                if let Err(e) = run_pipeline(&options).await {
                    warn!("Watch cycle failed: {:#}", e);
                }
                if watcher.drain() > 0 {
                    debouncer.on_event(Instant::now());
                }
                debouncer.finish(Instant::now());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}
