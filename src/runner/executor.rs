use crate::error::LaunchError;
use crate::parser::parse_counts;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout as tokio_timeout};
use tracing::{debug, warn};

use super::output::OutputBuffer;
use super::retry::{retry_with_backoff, RetryPolicy};
use super::task::{TaskResult, TaskStatus, TestTask};

/// How long to wait for pipe readers after the child is gone
const READER_GRACE: Duration = Duration::from_secs(2);

/// Captured output of a successful attempt
#[derive(Debug)]
pub struct AttemptOutput {
    pub output: String,
    pub duration: Duration,
}

/// A failed attempt, with whatever output it produced
#[derive(Debug)]
pub struct AttemptFailure {
    pub output: String,
    pub error: LaunchError,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

/// Runs one attempt of a task. The engine owns retries and scheduling.
#[async_trait]
pub trait TaskLauncher: Send + Sync {
    async fn launch(&self, task: &TestTask, attempt: u32)
        -> Result<AttemptOutput, AttemptFailure>;
}

/// Launches the project's test command as an OS subprocess.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    pub root: PathBuf,
    pub coverage: bool,
    pub verbose: bool,
    pub env: BTreeMap<String, String>,
    pub max_output_bytes: usize,
}

impl ProcessLauncher {
    fn command(&self, task: &TestTask) -> Command {
        let spec = if self.coverage {
            &task.project.coverage_command
        } else {
            &task.project.test_command
        };

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if task.project.append_files {
            cmd.args(task.files.iter().map(|f| &f.relative));
        }

        cmd.current_dir(self.root.join(&task.project.working_dir))
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

fn collect_stream<R>(
    stream: Option<R>,
    max_bytes: usize,
    echo: Option<String>,
) -> JoinHandle<OutputBuffer>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = OutputBuffer::new(max_bytes);
        let Some(stream) = stream else {
            return buffer;
        };
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {
                    // Test output is not guaranteed to be UTF-8
                    let line = String::from_utf8_lossy(trim_newline(&raw));
                    if let Some(prefix) = &echo {
                        println!("{} {}", prefix, line);
                    }
                    buffer.push_line(&line);
                }
                Err(e) => {
                    warn!("Failed to read test output: {}", e);
                    // Keep the pipe drained so the child never sees SIGPIPE
                    let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                    break;
                }
            }
        }
        if buffer.is_truncated() {
            debug!("Output exceeded {} bytes, keeping the tail", max_bytes);
        }
        buffer
    })
}

fn trim_newline(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

async fn finish_stream(handle: JoinHandle<OutputBuffer>) -> String {
    let abort = handle.abort_handle();
    match tokio_timeout(READER_GRACE, handle).await {
        Ok(Ok(buffer)) => buffer.into_string(),
        Ok(Err(e)) => {
            warn!("Output reader failed: {}", e);
            String::new()
        }
        Err(_) => {
            // A grandchild still holds the pipe open
            abort.abort();
            String::new()
        }
    }
}

#[async_trait]
impl TaskLauncher for ProcessLauncher {
    async fn launch(
        &self,
        task: &TestTask,
        attempt: u32,
    ) -> Result<AttemptOutput, AttemptFailure> {
        let mut cmd = self.command(task);
        debug!("{} attempt {}: {:?}", task.key(), attempt, cmd.as_std());

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| AttemptFailure {
            output: String::new(),
            error: LaunchError::Spawn {
                program: cmd.as_std().get_program().to_string_lossy().into_owned(),
                source: e,
            },
        })?;

        let echo = self.verbose.then(|| format!("[{}]", task.key()));
        let stdout = collect_stream(child.stdout.take(), self.max_output_bytes, echo.clone());
        let stderr = collect_stream(child.stderr.take(), self.max_output_bytes, echo);

        let status = tokio::select! {
            status = child.wait() => Some(status),
            _ = sleep(task.timeout) => None,
        };

        let status = match status {
            Some(status) => status,
            None => {
                warn!("{} exceeded {:?}, killing", task.key(), task.timeout);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {}: {}", task.key(), e);
                }
                let output = join_output(finish_stream(stdout).await, finish_stream(stderr).await);
                return Err(AttemptFailure {
                    output,
                    error: LaunchError::Timeout(task.timeout),
                });
            }
        };

        let output = join_output(finish_stream(stdout).await, finish_stream(stderr).await);
        let status = match status {
            Ok(status) => status,
            Err(e) => {
                return Err(AttemptFailure {
                    output,
                    error: LaunchError::Io(e),
                })
            }
        };

        if !status.success() {
            let error = match status.code() {
                Some(code) => LaunchError::NonZeroExit { code },
                None => LaunchError::Signaled,
            };
            return Err(AttemptFailure { output, error });
        }

        Ok(AttemptOutput {
            output,
            duration: start.elapsed(),
        })
    }
}

fn join_output(stdout: String, stderr: String) -> String {
    if stderr.is_empty() {
        stdout
    } else if stdout.is_empty() {
        stderr
    } else {
        format!("{}\n{}", stdout, stderr)
    }
}

/// Run a task to a terminal state: attempts with retries, then parse the final output
pub async fn execute_task<L>(launcher: &L, task: TestTask, policy: RetryPolicy) -> TaskResult
where
    L: TaskLauncher + ?Sized,
{
    let start = Instant::now();
    let key = task.key();

    let outcome = retry_with_backoff(&policy, &key, |attempt| launcher.launch(&task, attempt)).await;

    let (status, output, error) = match outcome.result {
        Ok(out) => {
            debug!("{} attempt finished in {:?}", key, out.duration);
            (TaskStatus::Success, out.output, None)
        }
        Err(failure) => (
            TaskStatus::Failed,
            failure.output,
            Some(failure.error.to_string()),
        ),
    };

    let counts = parse_counts(&output, task.project.framework).counts();

    TaskResult {
        project: task.project.key.clone(),
        test_type: task.test_type.clone(),
        status,
        counts,
        duration: start.elapsed(),
        retries: outcome.retries,
        error,
        output,
    }
}
