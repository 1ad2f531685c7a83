use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StreamalertError;

use super::{read_json, write_json};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Argon2id PHC hash; the plaintext password is never stored.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

pub trait UserStore: Send + Sync {
    /// Insert a new user. A duplicate email yields
    /// [`StreamalertError::EmailExists`].
    fn insert(&self, user: NewUser) -> Result<UserRecord, StreamalertError>;

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StreamalertError>;
}

fn build_record(user: NewUser) -> UserRecord {
    UserRecord {
        id: uuid::Uuid::new_v4().to_string(),
        email: user.email,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        password_hash: user.password_hash,
        created_at: Utc::now(),
    }
}

/// Users persisted as a JSON array under the data directory.
pub struct FileUserStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileUserStore {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("users.json"),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<UserRecord>, StreamalertError> {
        Ok(read_json::<Vec<UserRecord>>(&self.path)?.unwrap_or_default())
    }
}

impl UserStore for FileUserStore {
    fn insert(&self, user: NewUser) -> Result<UserRecord, StreamalertError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StreamalertError::Store("user store lock poisoned".into()))?;
        let mut users = self.load()?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StreamalertError::EmailExists(user.email));
        }
        let record = build_record(user);
        users.push(record.clone());
        write_json(&self.path, &users)?;
        Ok(record)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StreamalertError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StreamalertError::Store("user store lock poisoned".into()))?;
        Ok(self.load()?.into_iter().find(|u| u.email == email))
    }
}

/// In-memory user store for tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryUserStore {
    fn insert(&self, user: NewUser) -> Result<UserRecord, StreamalertError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| StreamalertError::Store("user store lock poisoned".into()))?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StreamalertError::EmailExists(user.email));
        }
        let record = build_record(user);
        users.push(record.clone());
        Ok(record)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StreamalertError> {
        let users = self
            .users
            .lock()
            .map_err(|_| StreamalertError::Store("user store lock poisoned".into()))?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }
}
