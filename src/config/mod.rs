pub mod loader;
pub mod types;

pub use loader::{discover_config_file, load_config};
pub use types::{AppConfig, AuthConfig, HttpConfig, PlatformConfig, RefreshConfig};
