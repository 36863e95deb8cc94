mod defaults;
mod options;
mod registry;
mod types;

pub use options::{OptionsRecord, RunOptions};
pub use registry::Registry;
pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::Path;

impl Default for Config {
    fn default() -> Self {
        Self {
            report_dir: default_report_dir(),
            base_branch: default_base_branch(),
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            max_output_bytes: default_max_output_bytes(),
            test_env: default_test_env(),
            projects: Vec::new(),
            test_types: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if given (it must exist), else the default file if present, else defaults
    pub fn load_or_default(path: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let candidate = root.join(DEFAULT_CONFIG_FILE);
                if candidate.exists() {
                    tracing::debug!("Loading config from {:?}", candidate);
                    Self::load(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the numeric fields
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "concurrency",
            self.concurrency as u64,
            1,
            MAX_CONCURRENCY_LIMIT as u64,
        )?;
        check_range(
            "max_retries",
            u64::from(self.max_retries),
            0,
            u64::from(MAX_RETRIES_LIMIT),
        )?;
        check_range(
            "max_output_bytes",
            self.max_output_bytes as u64,
            1024,
            u64::MAX,
        )?;
        Ok(())
    }
}

pub(crate) fn check_range(
    field: &'static str,
    value: u64,
    min: u64,
    max: u64,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
