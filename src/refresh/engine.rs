use std::sync::Arc;

use chrono::Utc;

use crate::error::StreamalertError;
use crate::provider::TokenProvider;
use crate::store::{CredentialRecord, CredentialStore};

/// Result of one freshness check. Never persisted; drives control flow and
/// logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The committed record was still valid; nothing was done.
    NotNeeded,
    /// A new token was acquired and committed.
    Refreshed,
}

/// Decides whether the committed token is stale and, if so, acquires and
/// commits a replacement. All side effects are confined to the store write.
pub struct RefreshEngine {
    store: Arc<dyn CredentialStore>,
    provider: Arc<dyn TokenProvider>,
}

impl RefreshEngine {
    pub fn new(store: Arc<dyn CredentialStore>, provider: Arc<dyn TokenProvider>) -> Self {
        Self { store, provider }
    }

    /// Check the committed record against the clock and refresh it when
    /// stale. Calls the provider at most once per invocation and never
    /// sleeps; retrying is the caller's concern.
    pub async fn ensure_fresh(&self) -> Result<RefreshOutcome, StreamalertError> {
        let stale = match self.store.get() {
            Ok(record) => record.is_stale(),
            // No record yet: the first successful acquisition creates it.
            Err(StreamalertError::NoCredentials) => true,
            Err(e) => return Err(e),
        };

        if !stale {
            return Ok(RefreshOutcome::NotNeeded);
        }

        let issued = self.provider.acquire().await?;
        let record = CredentialRecord {
            access_token: issued.access_token,
            refresh_token: None,
            expires_at: Utc::now() + chrono::Duration::seconds(issued.ttl_seconds),
        };
        self.store.update(record)?;
        Ok(RefreshOutcome::Refreshed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::provider::IssuedToken;
    use crate::store::MemoryCredentialStore;

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingProvider {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn acquire(&self) -> Result<IssuedToken, StreamalertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StreamalertError::Provider("boom".into()));
            }
            Ok(IssuedToken {
                access_token: "fresh-token".into(),
                ttl_seconds: 3600,
                token_type: "bearer".into(),
            })
        }
    }

    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn get(&self) -> Result<CredentialRecord, StreamalertError> {
            Err(StreamalertError::Store("disk on fire".into()))
        }

        fn update(&self, _record: CredentialRecord) -> Result<(), StreamalertError> {
            Err(StreamalertError::Store("disk on fire".into()))
        }
    }

    fn record_expiring_in(secs: i64) -> CredentialRecord {
        CredentialRecord {
            access_token: "old-token".into(),
            refresh_token: None,
            expires_at: Utc::now() + chrono::Duration::seconds(secs),
        }
    }

    #[tokio::test]
    async fn fresh_record_makes_no_provider_call() {
        let store = Arc::new(MemoryCredentialStore::with_record(record_expiring_in(3600)));
        let provider = CountingProvider::new(false);
        let engine = RefreshEngine::new(store.clone(), provider.clone());

        let outcome = engine.ensure_fresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::NotNeeded);
        assert_eq!(provider.calls(), 0);
        assert_eq!(store.get().unwrap().access_token, "old-token");
    }

    #[tokio::test]
    async fn stale_record_calls_provider_exactly_once() {
        let store = Arc::new(MemoryCredentialStore::with_record(record_expiring_in(-1)));
        let provider = CountingProvider::new(false);
        let engine = RefreshEngine::new(store.clone(), provider.clone());

        let outcome = engine.ensure_fresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Refreshed);
        assert_eq!(provider.calls(), 1);
        let record = store.get().unwrap();
        assert_eq!(record.access_token, "fresh-token");
        assert!(!record.is_stale());
    }

    #[tokio::test]
    async fn empty_store_bootstraps_first_acquisition() {
        let store = Arc::new(MemoryCredentialStore::new());
        let provider = CountingProvider::new(false);
        let engine = RefreshEngine::new(store.clone(), provider.clone());

        let outcome = engine.ensure_fresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Refreshed);
        assert_eq!(provider.calls(), 1);
        assert!(store.get().is_ok());
    }

    #[tokio::test]
    async fn store_read_error_propagates_without_provider_call() {
        let provider = CountingProvider::new(false);
        let engine = RefreshEngine::new(Arc::new(BrokenStore), provider.clone());

        let err = engine.ensure_fresh().await.unwrap_err();

        assert!(matches!(err, StreamalertError::Store(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn provider_error_leaves_old_record_committed() {
        let store = Arc::new(MemoryCredentialStore::with_record(record_expiring_in(-1)));
        let provider = CountingProvider::new(true);
        let engine = RefreshEngine::new(store.clone(), provider.clone());

        let err = engine.ensure_fresh().await.unwrap_err();

        assert!(matches!(err, StreamalertError::Provider(_)));
        // The stale record stays authoritative until a replacement commits.
        assert_eq!(store.get().unwrap().access_token, "old-token");
    }

    #[tokio::test]
    async fn repeated_calls_on_stale_record_each_call_provider_once() {
        let store = Arc::new(MemoryCredentialStore::with_record(record_expiring_in(-1)));
        let provider = CountingProvider::new(true);
        let engine = RefreshEngine::new(store, provider.clone());

        let _ = engine.ensure_fresh().await;
        let _ = engine.ensure_fresh().await;
        let _ = engine.ensure_fresh().await;

        assert_eq!(provider.calls(), 3);
    }
}
