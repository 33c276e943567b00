//! Bounded call policy for outbound collaborators: a fixed timeout per
//! attempt and a fixed number of retries for transient failures only.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Errors that can tell a transient failure from a definitive answer.
pub trait Retryable: fmt::Display + Sized {
    /// Timeouts and transport errors; never "not found" or "no route".
    fn is_transient(&self) -> bool;

    /// The error reported when an attempt exceeded the timeout.
    fn timed_out(after: Duration) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkPolicy {
    pub timeout_ms: u64,
    pub retries: u32,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        NetworkPolicy {
            timeout_ms: 10_000,
            retries: 1,
        }
    }
}

impl NetworkPolicy {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        NetworkPolicy {
            timeout_ms: timeout.as_millis() as u64,
            retries,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Run `call` under this policy. `operation` only labels log lines.
    pub async fn run<T, E, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, E>
    where
        E: Retryable,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let timeout = self.timeout();
        let mut attempt = 0;
        loop {
            let err = match tokio::time::timeout(timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => err,
                Err(_) => E::timed_out(timeout),
            };

            if !err.is_transient() || attempt >= self.retries {
                return Err(err);
            }
            attempt += 1;
            warn!(operation, attempt, error = %err, "transient failure, retrying");
        }
    }
}
