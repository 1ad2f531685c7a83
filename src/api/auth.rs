use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::StreamalertError;

const ISSUER: &str = "streamalert";

/// Claims embedded in every login token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The user's id.
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id (UUID v4).
    pub jti: String,
}

/// Issue an HS256 login token for the given user id.
pub fn issue_token(user_id: &str, config: &AuthConfig) -> Result<String, StreamalertError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iss: ISSUER.to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(config.token_ttl_hours)).timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| StreamalertError::AuthError(format!("cannot sign token: {e}")))
}

/// Validate a login token's signature, expiry, and issuer.
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<Claims, StreamalertError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| StreamalertError::AuthError(format!("invalid token: {e}")))
}

/// Argon2id hash with a random salt; parameters and salt are embedded in
/// the PHC string.
pub fn hash_password(password: &str) -> Result<String, StreamalertError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StreamalertError::AuthError(format!("cannot hash password: {e}")))
}

/// Verify a plaintext password against a stored PHC hash. A mismatch is
/// `Ok(false)`, not an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, StreamalertError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| StreamalertError::AuthError(format!("corrupt password hash: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(StreamalertError::AuthError(e.to_string())),
    }
}
