use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::PlatformConfig;
use crate::error::StreamalertError;

/// Fixed per-call timeout for identity provider requests, independent of the
/// retry backoff timing. A timeout is an ordinary provider error.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// A freshly issued access token and its time-to-live.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub ttl_seconds: i64,
    pub token_type: String,
}

/// Exchanges app credentials for a new access token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn acquire(&self) -> Result<IssuedToken, StreamalertError>;
}

/// Raw token response from the identity provider.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    token_type: String,
}

/// HTTP client for the streaming platform: token endpoint plus the users
/// lookup endpoint (see [`super::broadcasters`]).
pub struct IdentityClient {
    pub(super) http: reqwest::Client,
    pub(super) token_url: String,
    pub(super) api_url: String,
    pub(super) client_id: String,
    pub(super) client_secret: String,
}

impl IdentityClient {
    pub fn new(config: &PlatformConfig) -> Result<Self, StreamalertError> {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .map_err(|e| StreamalertError::Provider(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            token_url: config.token_url.clone(),
            api_url: config.api_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }
}

#[async_trait]
impl TokenProvider for IdentityClient {
    async fn acquire(&self) -> Result<IssuedToken, StreamalertError> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| StreamalertError::Provider(format!("token request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StreamalertError::Provider(format!(
                "token request failed with status {status}: {body}"
            )));
        }

        let token: TokenResponse = resp.json().await.map_err(|e| {
            StreamalertError::Provider(format!("failed to parse token response: {e}"))
        })?;

        Ok(IssuedToken {
            access_token: token.access_token,
            ttl_seconds: token.expires_in,
            token_type: token.token_type,
        })
    }
}
