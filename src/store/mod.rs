use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StreamalertError;

pub mod broadcasters;
pub mod credentials;
pub mod users;

pub use broadcasters::{BroadcasterRecord, BroadcasterStore, FileBroadcasterStore, MemoryBroadcasterStore};
pub use credentials::{CredentialRecord, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use users::{FileUserStore, MemoryUserStore, NewUser, UserRecord, UserStore};

/// Read a JSON store file, returning `None` when it does not exist yet.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StreamalertError> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StreamalertError::Store(format!(
                "cannot read {}: {e}",
                path.display()
            )))
        }
    };
    serde_json::from_str(&data).map(Some).map_err(|e| {
        StreamalertError::Store(format!("corrupt store file {}: {e}", path.display()))
    })
}

/// Replace a JSON store file. Writes through a sibling temp file and renames,
/// so concurrent readers only ever observe the last complete record.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StreamalertError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(value)
        .map_err(|e| StreamalertError::Store(format!("failed to serialize record: {e}")))?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
