use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration, merged from a config file and environment
/// overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Directory holding the JSON store files. Defaults to `~/.streamalert`.
    #[serde(default, rename = "dataDir")]
    pub data_dir: Option<PathBuf>,
}

/// Credentials and endpoints for the streaming platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default, rename = "clientId")]
    pub client_id: String,
    #[serde(default, rename = "clientSecret")]
    pub client_secret: String,
    #[serde(default = "default_token_url", rename = "tokenUrl")]
    pub token_url: String,
    #[serde(default = "default_api_url", rename = "apiUrl")]
    pub api_url: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_url: default_token_url(),
            api_url: default_api_url(),
        }
    }
}

/// Timing knobs for the background refresh loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between freshness checks.
    #[serde(default = "default_interval_secs", rename = "intervalSecs")]
    pub interval_secs: u64,
    /// Initial backoff delay in milliseconds.
    #[serde(default = "default_base_delay_ms", rename = "baseDelayMs")]
    pub base_delay_ms: u64,
    /// Backoff delay cap in seconds.
    #[serde(default = "default_max_delay_secs", rename = "maxDelaySecs")]
    pub max_delay_secs: u64,
    /// Attempts before a refresh failure becomes fatal.
    #[serde(default = "default_max_retries", rename = "maxRetries")]
    pub max_retries: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_addr", rename = "bindAddr")]
    pub bind_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, rename = "jwtSecret")]
    pub jwt_secret: String,
    /// Login token lifetime in hours.
    #[serde(default = "default_token_ttl_hours", rename = "tokenTtlHours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

fn default_token_url() -> String {
    "https://id.twitch.tv/oauth2/token".to_string()
}

fn default_api_url() -> String {
    "https://api.twitch.tv/helix".to_string()
}

fn default_interval_secs() -> u64 {
    300
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_secs() -> u64 {
    64
}

fn default_max_retries() -> u32 {
    5
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_token_ttl_hours() -> i64 {
    2190
}

impl AppConfig {
    /// Resolve the directory holding the JSON store files.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".streamalert")
        })
    }
}
