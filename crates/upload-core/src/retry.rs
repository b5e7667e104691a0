use crate::config::{Backoff, UploadConfig};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Result of running an operation under the retry policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed.
    AttemptsExceeded { attempts: usize, last: E },
    /// Cancellation was requested before the next attempt could start.
    Cancelled { attempts: usize, last: E },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> usize {
        match self {
            RetryError::AttemptsExceeded { attempts, .. }
            | RetryError::Cancelled { attempts, .. } => *attempts,
        }
    }

    pub fn into_last(self) -> E {
        match self {
            RetryError::AttemptsExceeded { last, .. } | RetryError::Cancelled { last, .. } => last,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff: Backoff::Linear,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: usize,
        base_delay: Duration,
        max_delay: Duration,
        backoff: Backoff,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: if max_delay.is_zero() {
                base_delay
            } else {
                max_delay
            },
            backoff,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
            Duration::from_millis(config.retry_max_delay_ms),
            config.backoff,
        )
    }

    /// Runs `op` until it succeeds, attempts run out, or `cancel` fires.
    ///
    /// `op` receives the 1-based attempt number. Cancellation is polled before
    /// every retry and also interrupts the backoff sleep; an attempt already
    /// in flight is never aborted.
    pub async fn run<F, Fut, T, E>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if attempt >= self.max_attempts {
                        return Err(RetryError::AttemptsExceeded {
                            attempts: attempt,
                            last: err,
                        });
                    }

                    let delay = self.backoff_delay(attempt);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(RetryError::Cancelled { attempts: attempt, last: err });
                        }
                        _ = sleep(delay) => {}
                    }

                    attempt += 1;
                }
            }
        }
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::from_millis(0);
        }

        let base_ms = self.base_delay.as_millis();
        let delay_ms = match self.backoff {
            Backoff::Linear => base_ms.saturating_mul(attempt.max(1) as u128),
            Backoff::Exponential => {
                let factor = 1u128 << attempt.saturating_sub(1).min(6);
                base_ms.saturating_mul(factor)
            }
        };
        let capped = delay_ms.min(self.max_delay.as_millis());
        Duration::from_millis(capped as u64)
    }
}
