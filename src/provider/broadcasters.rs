use async_trait::async_trait;
use serde::Deserialize;

use crate::error::StreamalertError;

use super::token::IdentityClient;

/// Platform identity for a broadcaster login, as returned by the users
/// endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcasterIdentity {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(rename = "type", default)]
    pub broadcaster_type: String,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    data: Vec<BroadcasterIdentity>,
}

/// Resolves broadcaster logins to platform identities.
#[async_trait]
pub trait BroadcasterLookup: Send + Sync {
    /// Logins unknown to the platform are simply absent from the result;
    /// an empty result is not an error.
    async fn lookup_broadcasters(
        &self,
        logins: &[String],
        access_token: &str,
    ) -> Result<Vec<BroadcasterIdentity>, StreamalertError>;
}

#[async_trait]
impl BroadcasterLookup for IdentityClient {
    async fn lookup_broadcasters(
        &self,
        logins: &[String],
        access_token: &str,
    ) -> Result<Vec<BroadcasterIdentity>, StreamalertError> {
        let query: Vec<(&str, &str)> = logins.iter().map(|l| ("login", l.as_str())).collect();
        let resp = self
            .http
            .get(format!("{}/users", self.api_url))
            .query(&query)
            .header("Client-Id", &self.client_id)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| StreamalertError::Provider(format!("user lookup failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StreamalertError::Provider(format!(
                "user lookup failed with status {status}: {body}"
            )));
        }

        let parsed: UsersResponse = resp.json().await.map_err(|e| {
            StreamalertError::Provider(format!("failed to parse user lookup response: {e}"))
        })?;

        Ok(parsed.data)
    }
}
