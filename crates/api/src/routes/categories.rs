//! Category CRUD handlers.
//!
//! Reads are open to everyone; writes require an authenticated actor.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use bramble_core::{Action, CategoryId, Resource};
use serde::Deserialize;

use super::ensure_allowed;
use crate::db::CategoryRepository;
use crate::error::{ApiError, Result, ValidationErrors};
use crate::middleware::OptionalAuth;
use crate::models::catalog::Category;
use crate::state::AppState;

/// Maximum category name length, matching the schema column.
const MAX_NAME_LENGTH: usize = 200;

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list).post(create))
        .route(
            "/api/categories/{id}",
            get(retrieve).put(update).delete(destroy),
        )
}

/// Category payload for create and update.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

fn validate(body: &CategoryRequest) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if body.name.trim().is_empty() {
        errors.add("name", "This field is required.");
    } else if body.name.len() > MAX_NAME_LENGTH {
        errors.add(
            "name",
            format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters."),
        );
    }
    errors.into_result()
}

/// List all categories.
pub async fn list(auth: OptionalAuth, State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    ensure_allowed(&auth.actor(), Action::List, Resource::Category)?;

    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// Retrieve a category by id.
pub async fn retrieve(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    ensure_allowed(&auth.actor(), Action::Retrieve, Resource::Category)?;

    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("category {id}")))?;

    Ok(Json(category))
}

/// Create a category. Requires authentication.
pub async fn create(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    ensure_allowed(&auth.actor(), Action::Create, Resource::Category)?;
    validate(&body)?;

    let category = CategoryRepository::new(state.pool())
        .create(body.name.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Rename a category. Requires authentication.
pub async fn update(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    ensure_allowed(&auth.actor(), Action::Update, Resource::Category)?;
    validate(&body)?;

    let category = CategoryRepository::new(state.pool())
        .update(id, body.name.trim())
        .await?;

    Ok(Json(category))
}

/// Delete a category. Requires authentication.
pub async fn destroy(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    ensure_allowed(&auth.actor(), Action::Delete, Resource::Category)?;

    let deleted = CategoryRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("category {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
