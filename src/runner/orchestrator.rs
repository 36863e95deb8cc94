use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::executor::{execute_task, TaskLauncher};
use super::retry::RetryPolicy;
use super::task::{TaskResult, TestTask};

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub max_concurrency: usize,
    pub retry: RetryPolicy,
    pub fail_fast: bool,
}

#[derive(Debug)]
pub struct RunReport {
    /// In completion order
    pub results: Vec<TaskResult>,
    /// Keys of tasks dropped from the queue by fail-fast
    pub cancelled: Vec<String>,
    pub total_duration: Duration,
}

/// Drives the task queue: one controller loop, bounded concurrency,
/// exclusive execution for tasks that must not run alongside others.
pub struct Orchestrator<L: TaskLauncher + ?Sized> {
    launcher: Arc<L>,
    settings: EngineSettings,
}

impl<L: TaskLauncher + ?Sized> Orchestrator<L> {
    pub fn new(launcher: Arc<L>, settings: EngineSettings) -> Self {
        let settings = EngineSettings {
            max_concurrency: settings.max_concurrency.max(1),
            ..settings
        };
        Self { launcher, settings }
    }

    /// Run every queued task. `on_complete` sees each result as it lands.
    pub async fn run<F>(&self, mut queue: VecDeque<TestTask>, mut on_complete: F) -> RunReport
    where
        F: FnMut(&TaskResult),
    {
        let start = Instant::now();
        let launcher = self.launcher.as_ref();
        let max = self.settings.max_concurrency;

        info!(
            "Running {} tasks with concurrency {}",
            queue.len(),
            max
        );

        let mut running = FuturesUnordered::new();
        // Key of the running task that excludes all others
        let mut exclusive: Option<String> = None;
        let mut aborted = false;
        let mut results = Vec::new();
        let mut cancelled = Vec::new();

        loop {
            while !aborted && exclusive.is_none() && running.len() < max {
                let Some(task) = queue.pop_front() else {
                    break;
                };
                if !task.parallel && !running.is_empty() {
                    // Wait for the pool to drain before an exclusive task
                    queue.push_front(task);
                    break;
                }

                let key = task.key();
                if !task.parallel {
                    exclusive = Some(key.clone());
                }
                debug!("Dispatching {} ({} running)", key, running.len());
                running.push(execute_task(launcher, task, self.settings.retry));
            }

            let Some(result) = running.next().await else {
                break;
            };

            if exclusive.as_deref() == Some(result.key().as_str()) {
                exclusive = None;
            }

            on_complete(&result);

            if result.failed() && self.settings.fail_fast && !aborted {
                aborted = true;
                cancelled = queue.drain(..).map(|t| t.key()).collect();
                warn!(
                    "Fail-fast: {} failed, cancelling {} queued tasks",
                    result.key(),
                    cancelled.len()
                );
            }

            results.push(result);
        }

        RunReport {
            results,
            cancelled,
            total_duration: start.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Registry;
    use crate::error::LaunchError;
    use crate::runner::executor::{AttemptFailure, AttemptOutput};
    use crate::runner::task::TaskStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct Window {
        key: String,
        start: Instant,
        end: Instant,
    }

    /// Sleeps per task, fails the keys it is told to, records every attempt window
    #[derive(Default)]
    struct MockLauncher {
        durations: HashMap<String, Duration>,
        failing: Vec<String>,
        windows: Mutex<Vec<Window>>,
        attempts: Mutex<HashMap<String, u32>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TaskLauncher for MockLauncher {
        async fn launch(
            &self,
            task: &TestTask,
            _attempt: u32,
        ) -> Result<AttemptOutput, AttemptFailure> {
            let key = task.key();
            *self.attempts.lock().unwrap().entry(key.clone()).or_default() += 1;

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let start = Instant::now();
            let duration = self
                .durations
                .get(&key)
                .copied()
                .unwrap_or(Duration::from_millis(20));
            tokio::time::sleep(duration).await;
            let end = Instant::now();

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.windows.lock().unwrap().push(Window {
                key: key.clone(),
                start,
                end,
            });

            if self.failing.contains(&key) {
                Err(AttemptFailure {
                    output: "1 failed".to_string(),
                    error: LaunchError::NonZeroExit { code: 1 },
                })
            } else {
                Ok(AttemptOutput {
                    output: "2 passed".to_string(),
                    duration,
                })
            }
        }
    }

    fn task(project: &str, test_type: &str, parallel: bool, priority: u32) -> TestTask {
        let mut descriptor = Registry::builtin().projects[0].clone();
        descriptor.key = project.to_string();
        TestTask {
            project: descriptor,
            test_type: test_type.to_string(),
            priority,
            files: Vec::new(),
            parallel,
            timeout: Duration::from_secs(5),
        }
    }

    fn settings(max_concurrency: usize, max_retries: u32, fail_fast: bool) -> EngineSettings {
        EngineSettings {
            max_concurrency,
            retry: RetryPolicy {
                max_retries,
                backoff_base: Duration::from_millis(1),
            },
            fail_fast,
        }
    }

    fn overlaps(a: &Window, b: &Window) -> bool {
        a.start < b.end && b.start < a.end
    }

    #[tokio::test]
    async fn test_concurrency_cap_respected() {
        let launcher = Arc::new(MockLauncher::default());
        let queue: VecDeque<_> = (0..8)
            .map(|i| task(&format!("p{}", i), "unit", true, 1))
            .collect();

        let engine = Orchestrator::new(launcher.clone(), settings(3, 0, false));
        let report = engine.run(queue, |_| {}).await;

        assert_eq!(report.results.len(), 8);
        assert!(launcher.peak.load(Ordering::SeqCst) <= 3);
        assert!(launcher.peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_exclusive_tasks_never_overlap() {
        let mut launcher = MockLauncher::default();
        launcher
            .durations
            .insert("a:unit".to_string(), Duration::from_millis(60));
        let launcher = Arc::new(launcher);

        let queue = VecDeque::from(vec![
            task("a", "unit", true, 1),
            task("b", "unit", true, 1),
            task("a", "e2e", false, 3),
            task("b", "e2e", false, 3),
            task("c", "perf", true, 4),
        ]);

        let engine = Orchestrator::new(launcher.clone(), settings(4, 0, false));
        let report = engine.run(queue, |_| {}).await;
        assert_eq!(report.results.len(), 5);

        let windows = launcher.windows.lock().unwrap().clone();
        for exclusive in windows.iter().filter(|w| w.key.ends_with(":e2e")) {
            for other in windows.iter().filter(|w| w.key != exclusive.key) {
                assert!(
                    !overlaps(exclusive, other),
                    "{} overlapped {}",
                    exclusive.key,
                    other.key
                );
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_follows_queue_order() {
        let launcher = Arc::new(MockLauncher::default());
        let queue = VecDeque::from(vec![
            task("a", "unit", true, 1),
            task("b", "unit", true, 1),
            task("a", "integration", true, 2),
            task("b", "integration", true, 2),
        ]);

        let engine = Orchestrator::new(launcher.clone(), settings(2, 0, false));
        engine.run(queue, |_| {}).await;

        let windows = launcher.windows.lock().unwrap().clone();
        let start_of = |key: &str| windows.iter().find(|w| w.key == key).unwrap().start;
        for unit in ["a:unit", "b:unit"] {
            for integration in ["a:integration", "b:integration"] {
                assert!(start_of(unit) <= start_of(integration));
            }
        }
    }

    #[tokio::test]
    async fn test_retries_bounded() {
        let launcher = Arc::new(MockLauncher {
            failing: vec!["a:unit".to_string()],
            ..Default::default()
        });
        let queue = VecDeque::from(vec![task("a", "unit", true, 1)]);

        let engine = Orchestrator::new(launcher.clone(), settings(4, 2, false));
        let report = engine.run(queue, |_| {}).await;

        let result = &report.results[0];
        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.retries, 2);
        assert_eq!(launcher.attempts.lock().unwrap()["a:unit"], 3);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_dispatch() {
        let launcher = Arc::new(MockLauncher {
            failing: vec!["a:unit".to_string()],
            ..Default::default()
        });
        let queue = VecDeque::from(vec![task("a", "unit", true, 1), task("b", "unit", true, 1)]);

        // Concurrency 1 so the second task is still queued when the first fails
        let engine = Orchestrator::new(launcher.clone(), settings(1, 0, true));
        let report = engine.run(queue, |_| {}).await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.cancelled, vec!["b:unit".to_string()]);
        assert!(!launcher.attempts.lock().unwrap().contains_key("b:unit"));
    }

    #[tokio::test]
    async fn test_fail_fast_drains_in_flight() {
        let mut launcher = MockLauncher {
            failing: vec!["a:unit".to_string()],
            ..Default::default()
        };
        launcher
            .durations
            .insert("b:unit".to_string(), Duration::from_millis(100));
        let launcher = Arc::new(launcher);

        let queue = VecDeque::from(vec![
            task("a", "unit", true, 1),
            task("b", "unit", true, 1),
            task("c", "unit", true, 1),
        ]);

        let engine = Orchestrator::new(launcher.clone(), settings(2, 0, true));
        let report = engine.run(queue, |_| {}).await;

        let keys: Vec<_> = report.results.iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec!["a:unit", "b:unit"]);
        assert_eq!(report.results[1].status, TaskStatus::Success);
        assert_eq!(report.cancelled, vec!["c:unit".to_string()]);
    }

    #[tokio::test]
    async fn test_failures_isolated_without_fail_fast() {
        let launcher = Arc::new(MockLauncher {
            failing: vec!["a:unit".to_string()],
            ..Default::default()
        });
        let queue = VecDeque::from(vec![task("a", "unit", true, 1), task("b", "unit", true, 1)]);

        let engine = Orchestrator::new(launcher, settings(1, 0, false));
        let mut seen = Vec::new();
        let report = engine.run(queue, |r| seen.push(r.key())).await;

        assert_eq!(report.results.len(), 2);
        assert!(report.cancelled.is_empty());
        assert_eq!(seen, vec!["a:unit", "b:unit"]);
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let engine = Orchestrator::new(Arc::new(MockLauncher::default()), settings(4, 0, false));
        let report = engine.run(VecDeque::new(), |_| {}).await;
        assert!(report.results.is_empty());
    }
}
