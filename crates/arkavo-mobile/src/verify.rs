//! Perform, re-observe, check: for effects a primitive command cannot confirm by itself.

use crate::observe::{CaptureOptions, ScreenSnapshot, SnapshotReader};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Retries after the initial check. Zero means one check and no compensation.
    pub retry_count: u32,
    #[serde(with = "crate::config::millis")]
    pub per_attempt_timeout: Duration,
}

impl VerifyOptions {
    pub fn new(retry_count: u32, per_attempt_timeout: Duration) -> Self {
        Self {
            retry_count,
            per_attempt_timeout,
        }
    }

    /// Upper bound for the whole loop. The first check is exempt so that even a zero
    /// budget observes the screen once.
    pub fn budget(&self) -> Duration {
        self.per_attempt_timeout
            .saturating_mul(self.retry_count.saturating_add(1))
    }
}

#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub achieved: bool,
    /// Predicate checks performed, counting from 1.
    pub attempts: u32,
    /// The snapshot of the last completed check.
    pub snapshot: Option<Arc<ScreenSnapshot>>,
}

pub struct VerificationLoop {
    reader: Arc<SnapshotReader>,
}

impl VerificationLoop {
    pub fn new(reader: Arc<SnapshotReader>) -> Self {
        Self { reader }
    }

    /// Checks `predicate` against a fresh snapshot up to `retry_count + 1` times, running
    /// `compensate` between checks. `compensate` receives the 1-based number of the check
    /// that just failed. Running out of attempts or budget is not an error; only channel
    /// and compensation failures are.
    pub async fn verify<P, C, F>(
        &self,
        mut predicate: P,
        mut compensate: C,
        options: VerifyOptions,
    ) -> Result<VerificationOutcome>
    where
        P: FnMut(&ScreenSnapshot) -> Result<bool>,
        C: FnMut(u32) -> F,
        F: Future<Output = Result<()>>,
    {
        let deadline = Instant::now() + options.budget();
        let mut attempts = 0;
        let mut last = None;

        loop {
            let capture = self.reader.capture(CaptureOptions::fresh());
            // The first check always runs to completion, whatever the budget.
            let snapshot = if attempts == 0 {
                capture.await?
            } else {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                match timeout(remaining, capture).await {
                    Ok(snapshot) => snapshot?,
                    Err(_) => break,
                }
            };
            attempts += 1;

            let achieved = match predicate(&snapshot) {
                Ok(achieved) => achieved,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::debug!(attempt = attempts, error = %e, "verification check failed");
                    false
                }
            };
            last = Some(snapshot);

            if achieved {
                tracing::debug!(attempts, "verification achieved");
                return Ok(VerificationOutcome {
                    achieved: true,
                    attempts,
                    snapshot: last,
                });
            }
            if attempts > options.retry_count {
                break;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tracing::debug!(attempt = attempts, remaining_ms = remaining.as_millis() as u64, "verification retry");
            match timeout(remaining, compensate(attempts)).await {
                Ok(result) => result?,
                Err(_) => break,
            }
        }

        tracing::info!(attempts, "verification not achieved");
        Ok(VerificationOutcome {
            achieved: false,
            attempts,
            snapshot: last,
        })
    }
}
