use std::time::Duration;

use rand::RngExt;
use tokio_util::sync::CancellationToken;

use crate::config::RefreshConfig;
use crate::error::StreamalertError;

use super::engine::{RefreshEngine, RefreshOutcome};

/// Bounded jittered exponential backoff over [`RefreshEngine::ensure_fresh`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay before the second attempt; doubles from here.
    pub base_delay: Duration,
    /// Cap on the pre-jitter delay.
    pub max_delay: Duration,
    /// Hard ceiling on attempts per tick. Always terminates the loop.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(64),
            max_retries: 5,
        }
    }
}

/// Result of one retried refresh attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Completed(RefreshOutcome),
    /// The shared cancellation signal fired during a backoff sleep.
    Cancelled,
    /// Every attempt failed. The only error shape that reaches the
    /// supervisor.
    Exhausted {
        attempts: u32,
        last_error: StreamalertError,
    },
}

impl RetryPolicy {
    pub fn from_config(config: &RefreshConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_secs(config.max_delay_secs),
            max_retries: config.max_retries.max(1),
        }
    }

    /// Backoff delay for a 0-based attempt index: doubling from the base,
    /// capped at `max_delay`, then scaled by a full-jitter factor in
    /// [0.5, 1.5).
    fn delay_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        let doubled = self.base_delay.saturating_mul(1u32 << attempt.min(31));
        doubled.min(self.max_delay).mul_f64(0.5 + jitter)
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.delay_with_jitter(attempt, rand::rng().random::<f64>())
    }

    /// Drive `ensure_fresh` until it succeeds, the attempt budget is spent,
    /// or the routine is cancelled mid-backoff.
    ///
    /// Staleness is re-derived on every attempt, so a token that became
    /// fresh through another path short-circuits to success. This layer owns
    /// all sleeping; the engine never sleeps. There is no sleep after the
    /// final failed attempt.
    pub async fn attempt(
        &self,
        engine: &RefreshEngine,
        cancel: &CancellationToken,
    ) -> AttemptOutcome {
        let mut failures = 0u32;
        loop {
            match engine.ensure_fresh().await {
                Ok(outcome) => return AttemptOutcome::Completed(outcome),
                Err(err) => {
                    failures += 1;
                    if failures >= self.max_retries {
                        return AttemptOutcome::Exhausted {
                            attempts: failures,
                            last_error: err,
                        };
                    }
                    let delay = self.backoff_delay(failures - 1);
                    tracing::warn!(
                        attempt = failures,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "token refresh attempt failed, backing off"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return AttemptOutcome::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}
