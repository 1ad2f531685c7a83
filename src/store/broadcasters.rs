use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StreamalertError;
use crate::provider::BroadcasterIdentity;

use super::{read_json, write_json};

/// A tracked broadcaster. Created with just a login; the platform identity
/// fields are filled in by the background sync routine.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BroadcasterRecord {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcaster_type: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl BroadcasterRecord {
    pub fn is_resolved(&self) -> bool {
        self.platform_id.is_some()
    }
}

pub trait BroadcasterStore: Send + Sync {
    /// Start tracking a broadcaster by login. Tracking the same login twice
    /// is an [`StreamalertError::InvalidRequest`].
    fn insert(&self, login: &str) -> Result<BroadcasterRecord, StreamalertError>;

    fn list(&self) -> Result<Vec<BroadcasterRecord>, StreamalertError>;

    /// Broadcasters whose platform identity has not been resolved yet.
    fn unresolved(&self) -> Result<Vec<BroadcasterRecord>, StreamalertError>;

    /// Fill in the platform identity for the matching login. Identities with
    /// no matching record are ignored.
    fn apply_identity(&self, identity: &BroadcasterIdentity) -> Result<(), StreamalertError>;
}

fn new_record(login: &str) -> BroadcasterRecord {
    BroadcasterRecord {
        login: login.to_string(),
        platform_id: None,
        display_name: None,
        broadcaster_type: None,
        added_at: Utc::now(),
    }
}

fn apply(records: &mut [BroadcasterRecord], identity: &BroadcasterIdentity) {
    if let Some(record) = records.iter_mut().find(|r| r.login == identity.login) {
        record.platform_id = Some(identity.id.clone());
        record.display_name = Some(identity.display_name.clone());
        record.broadcaster_type = Some(identity.broadcaster_type.clone());
    }
}

/// Broadcasters persisted as a JSON array under the data directory.
pub struct FileBroadcasterStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBroadcasterStore {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("broadcasters.json"),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<BroadcasterRecord>, StreamalertError> {
        Ok(read_json::<Vec<BroadcasterRecord>>(&self.path)?.unwrap_or_default())
    }
}

impl BroadcasterStore for FileBroadcasterStore {
    fn insert(&self, login: &str) -> Result<BroadcasterRecord, StreamalertError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StreamalertError::Store("broadcaster store lock poisoned".into()))?;
        let mut records = self.load()?;
        if records.iter().any(|r| r.login == login) {
            return Err(StreamalertError::InvalidRequest(format!(
                "broadcaster '{login}' is already tracked"
            )));
        }
        let record = new_record(login);
        records.push(record.clone());
        write_json(&self.path, &records)?;
        Ok(record)
    }

    fn list(&self) -> Result<Vec<BroadcasterRecord>, StreamalertError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StreamalertError::Store("broadcaster store lock poisoned".into()))?;
        self.load()
    }

    fn unresolved(&self) -> Result<Vec<BroadcasterRecord>, StreamalertError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StreamalertError::Store("broadcaster store lock poisoned".into()))?;
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| !r.is_resolved())
            .collect())
    }

    fn apply_identity(&self, identity: &BroadcasterIdentity) -> Result<(), StreamalertError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StreamalertError::Store("broadcaster store lock poisoned".into()))?;
        let mut records = self.load()?;
        apply(&mut records, identity);
        write_json(&self.path, &records)
    }
}

/// In-memory broadcaster store for tests.
#[derive(Default)]
pub struct MemoryBroadcasterStore {
    records: Mutex<Vec<BroadcasterRecord>>,
}

impl MemoryBroadcasterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadcasterStore for MemoryBroadcasterStore {
    fn insert(&self, login: &str) -> Result<BroadcasterRecord, StreamalertError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StreamalertError::Store("broadcaster store lock poisoned".into()))?;
        if records.iter().any(|r| r.login == login) {
            return Err(StreamalertError::InvalidRequest(format!(
                "broadcaster '{login}' is already tracked"
            )));
        }
        let record = new_record(login);
        records.push(record.clone());
        Ok(record)
    }

    fn list(&self) -> Result<Vec<BroadcasterRecord>, StreamalertError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StreamalertError::Store("broadcaster store lock poisoned".into()))?;
        Ok(records.clone())
    }

    fn unresolved(&self) -> Result<Vec<BroadcasterRecord>, StreamalertError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|r| !r.is_resolved())
            .collect())
    }

    fn apply_identity(&self, identity: &BroadcasterIdentity) -> Result<(), StreamalertError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StreamalertError::Store("broadcaster store lock poisoned".into()))?;
        apply(&mut records, identity);
        Ok(())
    }
}
