//! Fixed-delay retry for transient pipeline steps.

use std::future::Future;

use anyhow::{Error, Result};
use tracing::warn;

use crate::core::retry::RetryPolicy;

/// Failure of one attempt, classified for the retry loop.
#[derive(Debug)]
pub enum StepError {
    /// May succeed on another attempt.
    Transient(Error),
    /// Retrying cannot help; stop immediately.
    Permanent(Error),
}

impl StepError {
    pub fn permanent(err: impl Into<Error>) -> Self {
        StepError::Permanent(err.into())
    }
}

impl From<Error> for StepError {
    fn from(err: Error) -> Self {
        StepError::Transient(err)
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy runs out.
///
/// The error of the last attempt is returned, annotated with the attempt
/// count when the budget was exhausted.
pub async fn retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, StepError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(StepError::Permanent(err)) => {
                warn!(step = label, attempt, err = %format!("{err:#}"), "permanent failure, not retrying");
                return Err(err);
            }
            Err(StepError::Transient(err)) => match policy.delay_after(attempt) {
                Some(delay) => {
                    warn!(
                        step = label,
                        attempt,
                        max_attempts = policy.max_attempts,
                        delay_secs = delay.as_secs_f64(),
                        err = %format!("{err:#}"),
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    return Err(err.context(format!("{label} failed after {attempt} attempt(s)")));
                }
            },
        }
    }
}
