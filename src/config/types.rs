use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;

/// On-disk configuration (`phoenix-runner.yaml`). Every field is optional.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Environment injected into every test subprocess
    #[serde(default = "default_test_env")]
    pub test_env: BTreeMap<String, String>,

    /// Replaces the built-in project registry when non-empty
    #[serde(default)]
    pub projects: Vec<ProjectDescriptor>,

    /// Replaces the built-in test-type registry when non-empty
    #[serde(default)]
    pub test_types: Vec<TestTypeDescriptor>,
}

/// A program plus its argument vector. Never split from a shell string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct CommandSpec {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ProjectDescriptor {
    pub key: String,

    pub name: String,

    /// Relative to the run root
    pub working_dir: PathBuf,

    pub test_command: CommandSpec,

    pub coverage_command: CommandSpec,

    pub language: String,

    pub framework: Framework,

    /// Append the discovered test files to the command line
    #[serde(default = "default_true")]
    pub append_files: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TestTypeDescriptor {
    pub key: String,

    pub name: String,

    /// Globs matched against paths relative to the project directory
    pub patterns: Vec<String>,

    pub timeout_ms: u64,

    /// Whether tasks of this type may run alongside other tasks
    pub parallel: bool,

    /// Lower runs first
    pub priority: u32,
}

impl TestTypeDescriptor {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    Pytest,
    Jest,
    Vitest,
    Playwright,
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Framework::Pytest => write!(f, "pytest"),
            Framework::Jest => write!(f, "jest"),
            Framework::Vitest => write!(f, "vitest"),
            Framework::Playwright => write!(f, "playwright"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
    Markdown,
}
