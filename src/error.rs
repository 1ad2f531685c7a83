use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StreamalertError {
    #[error("Error in config {}: {detail}", path.display())]
    ConfigError { path: PathBuf, detail: String },

    #[error("No credential record stored yet")]
    NoCredentials,

    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Access token refresh failed after {attempts} attempts: {last_error}")]
    RefreshExhausted { attempts: u32, last_error: String },

    #[error("Routine '{routine}' failed: {source}")]
    RoutineFailed {
        routine: String,
        source: Box<StreamalertError>,
    },

    #[error("A user with email '{0}' already exists")]
    EmailExists(String),

    #[error("Invalid email or password")]
    InvalidLogin,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StreamalertError {
    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            StreamalertError::ConfigError { .. } => "config_error",
            StreamalertError::NoCredentials => "no_credentials",
            StreamalertError::Store(_) => "store_error",
            StreamalertError::Provider(_) => "provider_error",
            StreamalertError::RefreshExhausted { .. } => "refresh_exhausted",
            StreamalertError::RoutineFailed { .. } => "routine_failed",
            StreamalertError::EmailExists(_) => "email_exists",
            StreamalertError::InvalidLogin => "invalid_login",
            StreamalertError::InvalidRequest(_) => "invalid_request",
            StreamalertError::AuthError(_) => "auth_error",
            StreamalertError::IoError(_) => "io_error",
        }
    }

    /// Produce a structured JSON error object for API responses.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "message": self.to_string(),
                "code": self.code(),
            }
        })
    }
}
