use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unknown project '{key}' (known: {known})")]
    UnknownProject { key: String, known: String },

    #[error("Unknown test type '{key}' (known: {known})")]
    UnknownTestType { key: String, known: String },

    #[error("Duplicate {kind} key '{key}' in registry")]
    DuplicateKey { kind: &'static str, key: String },

    #[error("Project '{0}' has an empty command")]
    EmptyCommand(String),

    #[error("Test type '{0}' has a zero timeout")]
    ZeroTimeout(String),

    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("Registry has no {0} entries")]
    EmptyRegistry(&'static str),
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to build glob pattern '{pattern}': {source}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

#[derive(Error, Debug)]
pub enum GitError {
    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },

    #[error("Failed to invoke git: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("test timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process failed with exit code {code}")]
    NonZeroExit { code: i32 },

    #[error("Process terminated by signal")]
    Signaled,
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write report: {0}")]
    WriteReport(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to start file watcher: {0}")]
    Notify(#[from] notify::Error),
}
