use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::config::AuthConfig;
use crate::error::StreamalertError;
use crate::store::{BroadcasterStore, NewUser, UserStore};

pub mod auth;

pub use auth::Claims;

/// Shared state behind the user-facing HTTP API.
pub struct ApiState {
    pub users: Arc<dyn UserStore>,
    pub broadcasters: Arc<dyn BroadcasterStore>,
    pub auth: AuthConfig,
}

/// Build the API router: user registration/login plus broadcaster CRUD.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/broadcasters", get(list_broadcasters).post(add_broadcaster))
        .with_state(state)
}

impl IntoResponse for StreamalertError {
    fn into_response(self) -> Response {
        let status = match &self {
            StreamalertError::EmailExists(_) => StatusCode::CONFLICT,
            StreamalertError::InvalidLogin | StreamalertError::AuthError(_) => {
                StatusCode::UNAUTHORIZED
            }
            StreamalertError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(self.to_json())).into_response()
    }
}

/// Extract and validate the bearer token from the request headers.
fn authorize(headers: &HeaderMap, config: &AuthConfig) -> Result<Claims, StreamalertError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| StreamalertError::AuthError("missing bearer token".into()))?;
    auth::verify_token(token, config)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    email: String,
    username: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    password: String,
}

async fn register(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<RegisterBody>,
) -> Result<Response, StreamalertError> {
    if body.email.is_empty() || body.username.is_empty() || body.password.is_empty() {
        return Err(StreamalertError::InvalidRequest(
            "email, username and password are required".into(),
        ));
    }

    let password_hash = auth::hash_password(&body.password)?;
    let record = state.users.insert(NewUser {
        email: body.email,
        username: body.username,
        first_name: body.first_name,
        last_name: body.last_name,
        password_hash,
    })?;
    let token = auth::issue_token(&record.id, &state.auth)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User created successfully",
            "id": record.id,
            "username": record.username,
            "email": record.email,
            "token": token,
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<serde_json::Value>, StreamalertError> {
    let user = state
        .users
        .find_by_email(&body.email)?
        .ok_or(StreamalertError::InvalidLogin)?;
    if !auth::verify_password(&body.password, &user.password_hash)? {
        return Err(StreamalertError::InvalidLogin);
    }
    let token = auth::issue_token(&user.id, &state.auth)?;

    Ok(Json(serde_json::json!({
        "message": "User logged in successfully",
        "user": user.username,
        "token": token,
    })))
}

async fn list_broadcasters(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StreamalertError> {
    authorize(&headers, &state.auth)?;
    let records = state.broadcasters.list()?;
    Ok(Json(serde_json::json!({ "data": records })))
}

#[derive(Debug, Deserialize)]
struct AddBroadcasterBody {
    login: String,
}

async fn add_broadcaster(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<AddBroadcasterBody>,
) -> Result<Response, StreamalertError> {
    authorize(&headers, &state.auth)?;
    if body.login.is_empty() {
        return Err(StreamalertError::InvalidRequest("login is required".into()));
    }
    let record = state.broadcasters.insert(&body.login)?;
    Ok((StatusCode::CREATED, Json(serde_json::json!(record))).into_response())
}
