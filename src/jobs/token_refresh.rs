use std::sync::Arc;
use std::time::Duration;

use crate::error::StreamalertError;
use crate::refresh::{AttemptOutcome, RefreshEngine, RefreshOutcome, RetryPolicy};
use crate::supervisor::{Routine, RoutineFailure};

pub const TOKEN_REFRESH_ROUTINE: &str = "token-refresh";

/// Periodic freshness check for the app access token.
///
/// Ticks are strictly sequential: a tick's attempt (including its backoff
/// sleeps) finishes before the next tick is taken. Exhausting the retry
/// budget is fatal: the routine reports once and stops itself.
pub fn token_refresh_routine(
    engine: Arc<RefreshEngine>,
    policy: RetryPolicy,
    interval: Duration,
) -> Routine {
    Routine::new(TOKEN_REFRESH_ROUTINE, move |cancel, errors| async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first interval tick completes immediately; boot already did
        // its own freshness pass.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("stopping token refresh routine");
                    return;
                }
                _ = ticker.tick() => {}
            }
            match policy.attempt(&engine, &cancel).await {
                AttemptOutcome::Completed(RefreshOutcome::Refreshed) => {
                    tracing::info!("access token refreshed");
                }
                AttemptOutcome::Completed(RefreshOutcome::NotNeeded) => {
                    tracing::debug!("access token still valid");
                }
                AttemptOutcome::Cancelled => {
                    tracing::info!("stopping token refresh routine");
                    return;
                }
                AttemptOutcome::Exhausted {
                    attempts,
                    last_error,
                } => {
                    let _ = errors.try_send(RoutineFailure::new(
                        TOKEN_REFRESH_ROUTINE,
                        StreamalertError::RefreshExhausted {
                            attempts,
                            last_error: last_error.to_string(),
                        },
                    ));
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::provider::{IssuedToken, TokenProvider};
    use crate::store::{CredentialRecord, MemoryCredentialStore};
    use crate::supervisor::Supervisor;

    struct AlwaysFailingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenProvider for AlwaysFailingProvider {
        async fn acquire(&self) -> Result<IssuedToken, StreamalertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StreamalertError::Provider("identity provider down".into()))
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(8),
            max_retries: 2,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_is_reported_as_fatal() {
        let provider = Arc::new(AlwaysFailingProvider {
            calls: AtomicUsize::new(0),
        });
        let record = CredentialRecord {
            access_token: "old".into(),
            refresh_token: None,
            expires_at: Utc::now() - chrono::Duration::seconds(1),
        };
        let engine = Arc::new(RefreshEngine::new(
            Arc::new(MemoryCredentialStore::with_record(record)),
            provider.clone(),
        ));

        let mut supervisor = Supervisor::new();
        supervisor.start(vec![token_refresh_routine(
            engine,
            fast_policy(),
            Duration::from_millis(10),
        )]);

        let failure = supervisor.wait_for_shutdown().await.unwrap_err();
        assert_eq!(failure.routine, TOKEN_REFRESH_ROUTINE);
        assert_eq!(failure.error.code(), "refresh_exhausted");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_token_keeps_routine_running_without_provider_calls() {
        let provider = Arc::new(AlwaysFailingProvider {
            calls: AtomicUsize::new(0),
        });
        let record = CredentialRecord {
            access_token: "good".into(),
            refresh_token: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        };
        let engine = Arc::new(RefreshEngine::new(
            Arc::new(MemoryCredentialStore::with_record(record)),
            provider.clone(),
        ));

        let mut supervisor = Supervisor::new();
        supervisor.start(vec![
            token_refresh_routine(engine, fast_policy(), Duration::from_millis(10)),
            // Companion routine that triggers shutdown after several ticks.
            Routine::new("trigger", |_cancel, errors| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let _ = errors.try_send(RoutineFailure::new(
                    "trigger",
                    StreamalertError::Provider("stop".into()),
                ));
            }),
        ]);

        let failure = supervisor.wait_for_shutdown().await.unwrap_err();
        assert_eq!(failure.routine, "trigger");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
