use colored::Colorize;

use crate::config::load_config;
use crate::error::StreamalertError;
use crate::store::{BroadcasterStore, FileBroadcasterStore};

/// Start tracking a broadcaster by login. The serve loop resolves its
/// platform identity on the next sync tick.
pub async fn run_add(config_path: Option<&str>, login: &str) -> Result<(), StreamalertError> {
    let config = load_config(config_path)?;
    let store = FileBroadcasterStore::open(&config.data_dir());
    let record = store.insert(login)?;
    println!("Tracking broadcaster '{}'", record.login);
    Ok(())
}

/// List tracked broadcasters and their resolution state.
pub async fn run_list(config_path: Option<&str>) -> Result<(), StreamalertError> {
    let config = load_config(config_path)?;
    let store = FileBroadcasterStore::open(&config.data_dir());
    let records = store.list()?;

    if records.is_empty() {
        println!("No broadcasters tracked");
        return Ok(());
    }
    for record in records {
        match (&record.platform_id, &record.display_name) {
            (Some(id), Some(name)) => {
                println!("{}  {} (id {})", "resolved".green(), name, id);
            }
            _ => {
                println!("{}   {} (identity pending)", "pending".yellow(), record.login);
            }
        }
    }
    Ok(())
}
