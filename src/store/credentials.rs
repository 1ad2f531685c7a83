use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StreamalertError;

use super::{read_json, write_json};

/// The single app-level credential record.
///
/// Overwritten in full on every successful refresh; no history is kept. The
/// old record stays authoritative until the replacement is durably written.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CredentialRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// A record is stale once the current instant reaches its expiry.
    /// `now == expires_at` counts as stale: the token must not be used at or
    /// after the expiry instant.
    pub fn is_stale(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Read/full-replace access to the credential record.
pub trait CredentialStore: Send + Sync {
    /// The last committed record. An empty store yields
    /// [`StreamalertError::NoCredentials`], not a zero-value record.
    fn get(&self) -> Result<CredentialRecord, StreamalertError>;

    /// Replace the whole record, all-or-nothing.
    fn update(&self, record: CredentialRecord) -> Result<(), StreamalertError>;
}

/// Credential record persisted as a JSON file under the data directory.
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("credentials.json"),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<CredentialRecord, StreamalertError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StreamalertError::Store("credential store lock poisoned".into()))?;
        read_json::<CredentialRecord>(&self.path)?.ok_or(StreamalertError::NoCredentials)
    }

    fn update(&self, record: CredentialRecord) -> Result<(), StreamalertError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StreamalertError::Store("credential store lock poisoned".into()))?;
        write_json(&self.path, &record)
    }
}

/// In-memory credential store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryCredentialStore {
    record: Mutex<Option<CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: CredentialRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<CredentialRecord, StreamalertError> {
        let guard = self
            .record
            .lock()
            .map_err(|_| StreamalertError::Store("credential store lock poisoned".into()))?;
        guard.clone().ok_or(StreamalertError::NoCredentials)
    }

    fn update(&self, record: CredentialRecord) -> Result<(), StreamalertError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|_| StreamalertError::Store("credential store lock poisoned".into()))?;
        *guard = Some(record);
        Ok(())
    }
}
