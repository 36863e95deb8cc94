use crate::parser::TestCounts;
use crate::runner::TaskResult;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub tasks: usize,
    pub failed_tasks: usize,
    /// Tasks whose output had no recognizable summary
    pub unparsed_tasks: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.passed) / f64::from(self.total) * 100.0
    }

    /// 0 only when nothing failed
    pub fn exit_code(&self) -> u8 {
        if self.failed == 0 {
            0
        } else {
            1
        }
    }
}

/// Aggregate task results. Pure: no I/O, no clock.
pub fn summarize(results: &[TaskResult], duration: Duration) -> RunSummary {
    let mut counts = TestCounts::default();
    for result in results {
        counts += result.effective_counts();
    }

    RunSummary {
        total: counts.total(),
        passed: counts.passed,
        failed: counts.failed,
        skipped: counts.skipped,
        tasks: results.len(),
        failed_tasks: results.iter().filter(|r| r.failed()).count(),
        unparsed_tasks: results.iter().filter(|r| r.counts.is_none()).count(),
        duration_ms: duration.as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::TaskStatus;

    fn result(project: &str, status: TaskStatus, counts: Option<(u32, u32, u32)>) -> TaskResult {
        TaskResult {
            project: project.to_string(),
            test_type: "unit".to_string(),
            status,
            counts: counts.map(|(passed, failed, skipped)| TestCounts {
                passed,
                failed,
                skipped,
            }),
            duration: Duration::from_millis(10),
            retries: 0,
            error: None,
            output: String::new(),
        }
    }

    #[test]
    fn test_totals_are_sums() {
        let results = vec![
            result("a", TaskStatus::Success, Some((3, 0, 1))),
            result("b", TaskStatus::Failed, Some((5, 2, 0))),
            result("c", TaskStatus::Success, Some((7, 0, 2))),
        ];
        let summary = summarize(&results, Duration::from_secs(2));

        assert_eq!(summary.passed, 15);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.total, summary.passed + summary.failed + summary.skipped);
        assert_eq!(summary.failed_tasks, 1);
        assert_eq!(summary.duration_ms, 2000);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_all_passing_exits_zero() {
        let results = vec![result("backend", TaskStatus::Success, Some((3, 0, 0)))];
        let summary = summarize(&results, Duration::ZERO);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.exit_code(), 0);
        assert!((summary.success_rate() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failed_task_without_counts_fails_run() {
        let results = vec![
            result("a", TaskStatus::Success, Some((4, 0, 0))),
            result("b", TaskStatus::Failed, None),
        ];
        let summary = summarize(&results, Duration::ZERO);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.unparsed_tasks, 1);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_empty_run() {
        let summary = summarize(&[], Duration::ZERO);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(summary.success_rate(), 0.0);
    }
}
