use crate::config::ProjectDescriptor;
use crate::discovery::TestFileEntry;
use crate::parser::TestCounts;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// One (project, test type) unit of scheduled work.
#[derive(Debug, Clone)]
pub struct TestTask {
    pub project: ProjectDescriptor,
    pub test_type: String,
    pub priority: u32,
    pub files: Vec<TestFileEntry>,
    /// May run alongside other tasks
    pub parallel: bool,
    pub timeout: Duration,
}

impl TestTask {
    /// `project:type`, unique within a run
    pub fn key(&self) -> String {
        format!("{}:{}", self.project.key, self.test_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Terminal outcome of a [`TestTask`], written once by the engine.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub project: String,
    pub test_type: String,
    pub status: TaskStatus,
    /// `None` when the output could not be parsed
    pub counts: Option<TestCounts>,
    pub duration: Duration,
    pub retries: u32,
    pub error: Option<String>,
    pub output: String,
}

/// Persisted shape of a [`TaskResult`]. `counts` are the effective counts,
/// so per-task figures add up to the run summary.
#[derive(Serialize)]
struct TaskRecord<'a> {
    project: &'a str,
    test_type: &'a str,
    status: TaskStatus,
    counts: TestCounts,
    parsed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    synthetic_failure: bool,
    duration_ms: u64,
    retries: u32,
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "str::is_empty")]
    output: &'a str,
}

impl Serialize for TaskResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let counts = self.effective_counts();
        TaskRecord {
            project: &self.project,
            test_type: &self.test_type,
            status: self.status,
            counts,
            parsed: self.counts.is_some(),
            synthetic_failure: counts.failed != self.counts.unwrap_or_default().failed,
            duration_ms: self.duration.as_millis() as u64,
            retries: self.retries,
            error: self.error.as_deref(),
            output: &self.output,
        }
        .serialize(serializer)
    }
}

impl TaskResult {
    pub fn key(&self) -> String {
        format!("{}:{}", self.project, self.test_type)
    }

    pub fn failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }

    /// Counts as they enter the aggregate: a failed task always carries at
    /// least one failure, even when its output reported none or was unreadable.
    pub fn effective_counts(&self) -> TestCounts {
        let mut counts = self.counts.unwrap_or_default();
        if self.failed() && counts.failed == 0 {
            counts.failed = 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: TaskStatus, counts: Option<TestCounts>) -> TaskResult {
        TaskResult {
            project: "backend".to_string(),
            test_type: "unit".to_string(),
            status,
            counts,
            duration: Duration::from_millis(1500),
            retries: 0,
            error: None,
            output: String::new(),
        }
    }

    #[test]
    fn test_failed_unparseable_counts_one_failure() {
        let r = result(TaskStatus::Failed, None);
        assert_eq!(r.effective_counts().failed, 1);
        assert_eq!(r.effective_counts().total(), 1);
    }

    #[test]
    fn test_failed_with_failures_unchanged() {
        let counts = TestCounts {
            passed: 4,
            failed: 2,
            skipped: 0,
        };
        let r = result(TaskStatus::Failed, Some(counts));
        assert_eq!(r.effective_counts(), counts);
    }

    #[test]
    fn test_success_unparseable_is_zero() {
        let r = result(TaskStatus::Success, None);
        assert_eq!(r.effective_counts(), TestCounts::default());
    }

    #[test]
    fn test_serializes_duration_as_millis() {
        let json = serde_json::to_value(result(TaskStatus::Success, None)).unwrap();
        assert_eq!(json["duration_ms"], 1500);
        assert_eq!(json["status"], "success");
        assert!(json.get("output").is_none());
        assert_eq!(json["parsed"], false);
        assert!(json.get("synthetic_failure").is_none());
    }

    #[test]
    fn test_serialized_counts_include_synthetic_failure() {
        let json = serde_json::to_value(result(TaskStatus::Failed, None)).unwrap();
        assert_eq!(json["counts"]["failed"], 1);
        assert_eq!(json["counts"]["passed"], 0);
        assert_eq!(json["synthetic_failure"], true);

        let counts = TestCounts {
            passed: 2,
            failed: 3,
            skipped: 0,
        };
        let json = serde_json::to_value(result(TaskStatus::Failed, Some(counts))).unwrap();
        assert_eq!(json["counts"]["failed"], 3);
        assert_eq!(json["parsed"], true);
        assert!(json.get("synthetic_failure").is_none());
    }
}
