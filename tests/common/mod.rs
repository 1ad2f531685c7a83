use std::path::{Path, PathBuf};

use chrono::Utc;
use streamalert::store::{CredentialRecord, CredentialStore, FileCredentialStore};

/// Write an integration-test config file pointing at the given platform
/// endpoints, with a data directory next to it. Returns the config path.
#[allow(dead_code)]
pub fn write_config(dir: &Path, token_url: &str, api_url: &str) -> PathBuf {
    let config_path = dir.join("streamalert.json");
    let data_dir = dir.join("data");
    let config = serde_json::json!({
        "platform": {
            "clientId": "test-client-id",
            "clientSecret": "test-client-secret",
            "tokenUrl": token_url,
            "apiUrl": api_url,
        },
        "refresh": {
            "intervalSecs": 1,
            "baseDelayMs": 10,
            "maxDelaySecs": 1,
            "maxRetries": 5
        },
        "auth": { "jwtSecret": "integration-secret", "tokenTtlHours": 1 },
        "dataDir": data_dir.to_string_lossy(),
    });
    std::fs::write(
        &config_path,
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();
    config_path
}

/// Seed the credential store under `data_dir` with a record expiring
/// `ttl_secs` from now (negative for an already-stale record).
#[allow(dead_code)]
pub fn seed_credentials(data_dir: &Path, ttl_secs: i64) {
    let store = FileCredentialStore::open(data_dir);
    store
        .update(CredentialRecord {
            access_token: "seeded-token".into(),
            refresh_token: None,
            expires_at: Utc::now() + chrono::Duration::seconds(ttl_secs),
        })
        .unwrap();
}
