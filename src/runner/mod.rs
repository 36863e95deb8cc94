mod executor;
mod orchestrator;
mod output;
mod queue;
mod retry;
mod task;

pub use executor::{ProcessLauncher, TaskLauncher};
pub use orchestrator::{EngineSettings, Orchestrator, RunReport};
pub use queue::build_queue;
pub use retry::RetryPolicy;
pub use task::{TaskResult, TaskStatus, TestTask};

use crate::config::RunOptions;
use crate::discovery::{filter_by_changes, find_test_files};
use crate::error::RunnerError;
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::info;

/// Discover test files for every selected project, apply the incremental
/// filter when `changed` is given, and build the dispatch queue.
pub fn plan_tasks(
    options: &RunOptions,
    changed: Option<&[PathBuf]>,
) -> Result<VecDeque<TestTask>, RunnerError> {
    let mut analyzed = Vec::with_capacity(options.projects.len());

    for project in &options.projects {
        let files = find_test_files(&options.root, project, &options.test_types)?;
        let files = match changed {
            Some(changed) => filter_by_changes(files, project, changed),
            None => files,
        };
        analyzed.push((project.clone(), files));
    }

    let queue = build_queue(&analyzed, &options.test_types);
    info!("Planned {} tasks", queue.len());
    Ok(queue)
}

impl EngineSettings {
    pub fn from_options(options: &RunOptions) -> Self {
        Self {
            max_concurrency: options.max_concurrency,
            retry: RetryPolicy {
                max_retries: options.max_retries,
                backoff_base: options.backoff_base,
            },
            fail_fast: options.fail_fast,
        }
    }
}

impl ProcessLauncher {
    pub fn from_options(options: &RunOptions) -> Self {
        Self {
            root: options.root.clone(),
            coverage: options.coverage,
            verbose: options.verbose,
            env: options.test_env.clone(),
            max_output_bytes: options.max_output_bytes,
        }
    }
}
