//! Token issuance handlers.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::post,
};
use bramble_core::UserId;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result, ValidationErrors};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

/// Login request payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response: the bearer token to present on later requests.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: UserId,
    pub username: String,
}

/// Exchange username/password for a bearer token.
///
/// # Errors
///
/// Returns 400 for a malformed payload, 403 for wrong credentials.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let mut errors = ValidationErrors::new();
    if body.username.trim().is_empty() {
        errors.add("username", "This field is required.");
    }
    if body.password.is_empty() {
        errors.add("password", "This field is required.");
    }
    errors.into_result()?;

    let (user, token) = AuthService::new(state.pool())
        .login(&body.username, &body.password)
        .await?;

    tracing::info!(user_id = %user.id, "login");

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

/// Revoke the presented bearer token.
///
/// Succeeds with 204 whether or not the token was known; revoking twice is
/// not an error.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::AuthRequired)?;

    AuthService::new(state.pool()).logout(token).await?;

    Ok(StatusCode::NO_CONTENT)
}
