use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Linear backoff: `base * attempt` after the `attempt`-th failure
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }
}

#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Retries consumed, never more than `max_retries`
    pub retries: u32,
}

/// Run `operation` (given the 1-based attempt number) until it succeeds or
/// `max_retries` retries are spent
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(result) => {
                return RetryOutcome {
                    result: Ok(result),
                    retries: attempt - 1,
                }
            }
            Err(e) if attempt > policy.max_retries => {
                warn!("{}: all {} attempts failed: {}", label, attempt, e);
                return RetryOutcome {
                    result: Err(e),
                    retries: attempt - 1,
                };
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "{}: attempt {} failed: {}. Retrying in {:?}...",
                    label, attempt, e, delay
                );
                sleep(delay).await;
            }
        }
    }
}
