use std::path::{Path, PathBuf};

use crate::error::StreamalertError;

use super::types::AppConfig;

/// Discover the config file to use, in precedence order (highest first).
///
/// Precedence:
/// 1. `--config` CLI flag
/// 2. `STREAMALERT_CONFIG` env var
/// 3. `./config/streamalert.json` (project-level)
/// 4. `~/.streamalert/config.json` (home-level)
///
/// Returns `None` when no file exists; the service then runs on defaults
/// plus environment overrides.
pub fn discover_config_file(cli_config: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = cli_config {
        let p = PathBuf::from(path);
        if p.exists() {
            return Some(p);
        }
    }

    if let Ok(env_path) = std::env::var("STREAMALERT_CONFIG") {
        let p = PathBuf::from(&env_path);
        if p.exists() {
            return Some(p);
        }
    }

    let project_config = PathBuf::from("./config/streamalert.json");
    if project_config.exists() {
        return Some(project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".streamalert").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

fn load_config_file(path: &Path) -> Result<AppConfig, StreamalertError> {
    let content = std::fs::read_to_string(path).map_err(|e| StreamalertError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Cannot read file: {e}"),
    })?;

    serde_json::from_str::<AppConfig>(&content).map_err(|e| StreamalertError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Invalid JSON: {e}"),
    })
}

/// Overlay secrets and endpoints from the environment.
///
/// Env vars always win over file values, so deployments can keep secrets
/// out of the config file entirely.
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(val) = std::env::var("STREAMALERT_CLIENT_ID") {
        config.platform.client_id = val;
    }
    if let Ok(val) = std::env::var("STREAMALERT_CLIENT_SECRET") {
        config.platform.client_secret = val;
    }
    if let Ok(val) = std::env::var("STREAMALERT_JWT_SECRET") {
        config.auth.jwt_secret = val;
    }
    if let Ok(val) = std::env::var("STREAMALERT_BIND_ADDR") {
        config.http.bind_addr = val;
    }
    if let Ok(val) = std::env::var("STREAMALERT_DATA_DIR") {
        config.data_dir = Some(PathBuf::from(val));
    }
}

fn validate(config: &AppConfig, source: &Path) -> Result<(), StreamalertError> {
    let missing = [
        ("platform.clientId / STREAMALERT_CLIENT_ID", config.platform.client_id.is_empty()),
        ("platform.clientSecret / STREAMALERT_CLIENT_SECRET", config.platform.client_secret.is_empty()),
        ("auth.jwtSecret / STREAMALERT_JWT_SECRET", config.auth.jwt_secret.is_empty()),
    ];
    for (name, is_missing) in missing {
        if is_missing {
            return Err(StreamalertError::ConfigError {
                path: source.to_path_buf(),
                detail: format!("{name} is not set"),
            });
        }
    }
    if config.refresh.max_retries == 0 {
        return Err(StreamalertError::ConfigError {
            path: source.to_path_buf(),
            detail: "refresh.maxRetries must be at least 1".into(),
        });
    }
    Ok(())
}

/// Load, overlay, and validate the full configuration.
pub fn load_config(cli_config: Option<&str>) -> Result<AppConfig, StreamalertError> {
    let discovered = discover_config_file(cli_config);
    let mut config = match &discovered {
        Some(path) => load_config_file(path)?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config);
    let source = discovered.unwrap_or_else(|| PathBuf::from("<env>"));
    validate(&config, &source)?;
    Ok(config)
}
