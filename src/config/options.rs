use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::types::{OutputFormat, ProjectDescriptor, TestTypeDescriptor};

/// Fully resolved and validated settings for one `run` (or one `watch` cycle).
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    pub projects: Vec<ProjectDescriptor>,
    pub test_types: Vec<TestTypeDescriptor>,
    pub parallel: bool,
    /// Already forced to 1 when `parallel` is false
    pub max_concurrency: usize,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub verbose: bool,
    pub coverage: bool,
    pub incremental: bool,
    pub fail_fast: bool,
    pub base_branch: String,
    pub format: OutputFormat,
    /// `None` disables persisting the JSON report
    pub report_dir: Option<PathBuf>,
    pub max_output_bytes: usize,
    pub test_env: BTreeMap<String, String>,
}

/// The subset of [`RunOptions`] recorded in the persisted report.
#[derive(Debug, Clone, Serialize)]
pub struct OptionsRecord {
    pub projects: Vec<String>,
    pub types: Vec<String>,
    pub parallel: bool,
    pub max_concurrency: usize,
    pub retries: u32,
    pub verbose: bool,
    pub coverage: bool,
    pub incremental: bool,
    pub fail_fast: bool,
    pub base_branch: String,
}

impl RunOptions {
    pub fn record(&self) -> OptionsRecord {
        OptionsRecord {
            projects: self.projects.iter().map(|p| p.key.clone()).collect(),
            types: self.test_types.iter().map(|t| t.key.clone()).collect(),
            parallel: self.parallel,
            max_concurrency: self.max_concurrency,
            retries: self.max_retries,
            verbose: self.verbose,
            coverage: self.coverage,
            incremental: self.incremental,
            fail_fast: self.fail_fast,
            base_branch: self.base_branch.clone(),
        }
    }

    /// Settings forced by watch mode
    pub fn for_watch(mut self) -> Self {
        self.parallel = false;
        self.max_concurrency = 1;
        self.max_retries = 1;
        self.coverage = false;
        self.incremental = true;
        self
    }
}
