//! User CRUD handlers.
//!
//! Registration (create) is the one action open to anonymous actors. All
//! other actions require authentication, and non-staff actors only ever see
//! their own record.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use bramble_core::{Action, Resource, UserId, visible_scope};
use serde::Deserialize;

use super::ensure_allowed;
use crate::db::{UserChanges, UserRepository};
use crate::error::{ApiError, Result, ValidationErrors};
use crate::middleware::OptionalAuth;
use crate::models::user::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Maximum username length, matching the schema column.
const MAX_USERNAME_LENGTH: usize = 150;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/{id}", get(retrieve).put(update).delete(destroy))
}

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

/// Partial update payload; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn validate_username(errors: &mut ValidationErrors, username: &str) {
    if username.trim().is_empty() {
        errors.add("username", "This field is required.");
    } else if username.len() > MAX_USERNAME_LENGTH {
        errors.add(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_LENGTH} characters."),
        );
    }
}

fn validate_email(errors: &mut ValidationErrors, email: Option<&str>) {
    if let Some(email) = email
        && !email.contains('@')
    {
        errors.add("email", "Enter a valid email address.");
    }
}

/// List users visible to the actor: all of them for staff, only their own
/// record for everyone else.
pub async fn list(
    auth: OptionalAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    let actor = auth.actor();
    ensure_allowed(&actor, Action::List, Resource::User)?;

    let scope = visible_scope(&actor, Resource::User);
    let users = UserRepository::new(state.pool()).list(scope).await?;

    Ok(Json(users))
}

/// Retrieve a user by id within the actor's visible set.
pub async fn retrieve(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    let actor = auth.actor();
    ensure_allowed(&actor, Action::Retrieve, Resource::User)?;

    let scope = visible_scope(&actor, Resource::User);
    let user = UserRepository::new(state.pool())
        .get(scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;

    Ok(Json(user))
}

/// Register a new account. Open to anonymous actors.
pub async fn create(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let actor = auth.actor();
    ensure_allowed(&actor, Action::Create, Resource::User)?;

    let mut errors = ValidationErrors::new();
    validate_username(&mut errors, &body.username);
    validate_email(&mut errors, body.email.as_deref());
    if body.password.is_empty() {
        errors.add("password", "This field is required.");
    }
    errors.into_result()?;

    let user = AuthService::new(state.pool())
        .register(&body.username, body.email.as_deref(), &body.password)
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => {
                ApiError::Validation(ValidationErrors::single(
                    "username",
                    "A user with that username already exists.",
                ))
            }
            AuthError::WeakPassword(msg) => {
                ApiError::Validation(ValidationErrors::single("password", msg))
            }
            other => ApiError::Auth(other),
        })?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a user within the actor's visible set.
pub async fn update(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let actor = auth.actor();
    ensure_allowed(&actor, Action::Update, Resource::User)?;

    let scope = visible_scope(&actor, Resource::User);
    let repo = UserRepository::new(state.pool());

    // Visibility first: updating a record outside the scope reads as absent.
    repo.get(scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;

    let mut errors = ValidationErrors::new();
    if let Some(username) = body.username.as_deref() {
        validate_username(&mut errors, username);
    }
    validate_email(&mut errors, body.email.as_deref());
    errors.into_result()?;

    let password_hash = match body.password.as_deref() {
        Some(password) => Some(
            AuthService::new(state.pool())
                .prepare_password(password)
                .map_err(|e| match e {
                    AuthError::WeakPassword(msg) => {
                        ApiError::Validation(ValidationErrors::single("password", msg))
                    }
                    other => ApiError::Auth(other),
                })?,
        ),
        None => None,
    };

    let user = repo
        .update(
            id,
            UserChanges {
                username: body.username,
                email: body.email.map(Some),
                password_hash,
            },
        )
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::Conflict(_) => {
                ApiError::Validation(ValidationErrors::single(
                    "username",
                    "A user with that username already exists.",
                ))
            }
            other => ApiError::Database(other),
        })?;

    Ok(Json(user))
}

/// Delete a user within the actor's visible set.
pub async fn destroy(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    let actor = auth.actor();
    ensure_allowed(&actor, Action::Delete, Resource::User)?;

    let scope = visible_scope(&actor, Resource::User);
    let repo = UserRepository::new(state.pool());

    repo.get(scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;

    repo.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
