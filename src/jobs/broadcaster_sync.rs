use std::sync::Arc;
use std::time::Duration;

use crate::error::StreamalertError;
use crate::provider::BroadcasterLookup;
use crate::store::{BroadcasterStore, CredentialStore};
use crate::supervisor::Routine;

pub const BROADCASTER_SYNC_ROUTINE: &str = "broadcaster-sync";

/// Resolve pending broadcaster identities once. Returns the number of
/// identities applied.
///
/// Uses the committed credential record as-is; keeping it fresh is the
/// refresh routine's job.
pub async fn sync_broadcasters(
    lookup: &dyn BroadcasterLookup,
    broadcasters: &dyn BroadcasterStore,
    credentials: &dyn CredentialStore,
) -> Result<usize, StreamalertError> {
    let pending = broadcasters.unresolved()?;
    if pending.is_empty() {
        return Ok(0);
    }

    let record = credentials.get()?;
    let logins: Vec<String> = pending.iter().map(|r| r.login.clone()).collect();
    let identities = lookup
        .lookup_broadcasters(&logins, &record.access_token)
        .await?;

    for identity in &identities {
        broadcasters.apply_identity(identity)?;
    }
    Ok(identities.len())
}

/// Periodic identity resolution for tracked broadcasters.
///
/// Failures here are transient (the next tick retries); only token refresh
/// exhaustion is allowed to take the process down.
pub fn broadcaster_sync_routine(
    lookup: Arc<dyn BroadcasterLookup>,
    broadcasters: Arc<dyn BroadcasterStore>,
    credentials: Arc<dyn CredentialStore>,
    interval: Duration,
) -> Routine {
    Routine::new(BROADCASTER_SYNC_ROUTINE, move |cancel, _errors| async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("stopping broadcaster sync routine");
                    return;
                }
                _ = ticker.tick() => {}
            }
            match sync_broadcasters(lookup.as_ref(), broadcasters.as_ref(), credentials.as_ref())
                .await
            {
                Ok(0) => tracing::debug!("no broadcasters waiting for identity"),
                Ok(resolved) => tracing::info!(resolved, "broadcaster identities updated"),
                Err(err) => tracing::warn!(error = %err, "broadcaster sync failed"),
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
    use crate::provider::BroadcasterIdentity;
    use crate::store::{CredentialRecord, MemoryBroadcasterStore, MemoryCredentialStore};

    struct FixedLookup {
        calls: AtomicUsize,
        identities: Vec<BroadcasterIdentity>,
    }

    impl FixedLookup {
        fn new(identities: Vec<BroadcasterIdentity>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                identities,
            }
        }
    }

    #[async_trait]
    impl BroadcasterLookup for FixedLookup {
        async fn lookup_broadcasters(
            &self,
            logins: &[String],
            _access_token: &str,
        ) -> Result<Vec<BroadcasterIdentity>, StreamalertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .identities
                .iter()
                .filter(|i| logins.contains(&i.login))
                .cloned()
                .collect())
        }
    }

    fn valid_credentials() -> MemoryCredentialStore {
        MemoryCredentialStore::with_record(CredentialRecord {
            access_token: "tok".into(),
            refresh_token: None,
            expires_at: Utc::now() + chrono::Duration::hours(1),
        })
    }

    fn identity(login: &str, id: &str) -> BroadcasterIdentity {
        BroadcasterIdentity {
            id: id.into(),
            login: login.into(),
            display_name: login.to_uppercase(),
            broadcaster_type: String::new(),
        }
    }

    #[tokio::test]
    async fn resolves_pending_broadcasters() {
        let broadcasters = MemoryBroadcasterStore::new();
        broadcasters.insert("cohh").unwrap();
        broadcasters.insert("pokimane").unwrap();
        let lookup = FixedLookup::new(vec![identity("cohh", "1"), identity("pokimane", "2")]);

        let resolved = sync_broadcasters(&lookup, &broadcasters, &valid_credentials())
            .await
            .unwrap();

        assert_eq!(resolved, 2);
        assert!(broadcasters.unresolved().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_pending_broadcasters_skips_lookup() {
        let broadcasters = MemoryBroadcasterStore::new();
        let lookup = FixedLookup::new(vec![]);

        let resolved = sync_broadcasters(&lookup, &broadcasters, &valid_credentials())
            .await
            .unwrap();

        assert_eq!(resolved, 0);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_credentials_is_an_error() {
        let broadcasters = MemoryBroadcasterStore::new();
        broadcasters.insert("cohh").unwrap();
        let lookup = FixedLookup::new(vec![]);
        let credentials = MemoryCredentialStore::new();

        let err = sync_broadcasters(&lookup, &broadcasters, &credentials)
            .await
            .unwrap_err();

        assert!(matches!(err, StreamalertError::NoCredentials));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_logins_stay_pending() {
        let broadcasters = MemoryBroadcasterStore::new();
        broadcasters.insert("cohh").unwrap();
        broadcasters.insert("ghost").unwrap();
        let lookup = FixedLookup::new(vec![identity("cohh", "1")]);

        let resolved = sync_broadcasters(&lookup, &broadcasters, &valid_credentials())
            .await
            .unwrap();

        assert_eq!(resolved, 1);
        let pending = broadcasters.unresolved().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].login, "ghost");
    }
}
