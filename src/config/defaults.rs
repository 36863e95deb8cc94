use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "phoenix-runner.yaml";

pub fn default_concurrency() -> usize {
    4
}

pub fn default_report_dir() -> PathBuf {
    PathBuf::from("test-reports")
}

pub fn default_base_branch() -> String {
    "main".to_string()
}

pub fn default_max_retries() -> u32 {
    2
}

pub fn default_backoff_base_ms() -> u64 {
    1000
}

pub fn default_max_output_bytes() -> usize {
    1024 * 1024
}

pub fn default_test_env() -> BTreeMap<String, String> {
    BTreeMap::from([("NODE_ENV".to_string(), "test".to_string())])
}

pub fn default_true() -> bool {
    true
}

pub const MAX_RETRIES_LIMIT: u32 = 10;
pub const MAX_CONCURRENCY_LIMIT: usize = 64;
