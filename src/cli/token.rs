use std::sync::Arc;

use colored::Colorize;

use crate::config::load_config;
use crate::error::StreamalertError;
use crate::provider::IdentityClient;
use crate::refresh::{RefreshEngine, RefreshOutcome};
use crate::store::{CredentialStore, FileCredentialStore};

/// Print the stored token's freshness.
pub async fn run_status(config_path: Option<&str>) -> Result<(), StreamalertError> {
    let config = load_config(config_path)?;
    let store = FileCredentialStore::open(&config.data_dir());

    match store.get() {
        Ok(record) if record.is_stale() => {
            println!(
                "{}: token expired at {}",
                "stale".red().bold(),
                record.expires_at
            );
        }
        Ok(record) => {
            println!(
                "{}: token valid until {}",
                "fresh".green().bold(),
                record.expires_at
            );
        }
        Err(StreamalertError::NoCredentials) => {
            println!("{}: no token acquired yet", "empty".yellow().bold());
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Run one freshness check right now, acquiring a token if needed.
pub async fn run_refresh(config_path: Option<&str>) -> Result<(), StreamalertError> {
    let config = load_config(config_path)?;
    let store = Arc::new(FileCredentialStore::open(&config.data_dir()));
    let client = Arc::new(IdentityClient::new(&config.platform)?);
    let engine = RefreshEngine::new(store.clone(), client);

    match engine.ensure_fresh().await? {
        RefreshOutcome::Refreshed => {
            let record = store.get()?;
            println!("Access token refreshed, valid until {}", record.expires_at);
        }
        RefreshOutcome::NotNeeded => {
            println!("Access token is still valid");
        }
    }
    Ok(())
}
