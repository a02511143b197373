//! Review CRUD handlers.
//!
//! Reviews have no anonymous surface: every action requires an
//! authenticated actor. The author is always set server-side from the
//! acting user; any author supplied in a payload is ignored.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use bramble_core::{Action, ProductId, Resource, ReviewId};
use serde::Deserialize;

use super::ensure_allowed;
use crate::db::{ReviewInput, ReviewRepository};
use crate::error::{ApiError, Result, ValidationErrors};
use crate::middleware::RequireAuth;
use crate::models::review::Review;
use crate::state::AppState;

/// Build the reviews router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reviews", get(list).post(create))
        .route(
            "/api/reviews/{id}",
            get(retrieve).put(update).delete(destroy),
        )
}

/// Review payload for create and update. There is deliberately no author
/// field; the author is the authenticated actor.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub product: ProductId,
    pub rating: i32,
    pub comment: String,
}

fn validate(body: &ReviewRequest) -> Result<ReviewInput> {
    let mut errors = ValidationErrors::new();

    if !(1..=5).contains(&body.rating) {
        errors.add("rating", "Ensure this value is between 1 and 5.");
    }
    if body.comment.trim().is_empty() {
        errors.add("comment", "This field is required.");
    }
    errors.into_result()?;

    Ok(ReviewInput {
        product: body.product,
        rating: body.rating,
        comment: body.comment.trim().to_owned(),
    })
}

/// A dangling product reference in a payload is a field error.
fn fk_to_field_error(err: crate::db::RepositoryError) -> ApiError {
    match err {
        crate::db::RepositoryError::ForeignKey(_) => {
            ApiError::Validation(ValidationErrors::single("product", "Unknown product."))
        }
        other => ApiError::Database(other),
    }
}

/// List all reviews.
pub async fn list(auth: RequireAuth, State(state): State<AppState>) -> Result<Json<Vec<Review>>> {
    ensure_allowed(&auth.0.actor(), Action::List, Resource::Review)?;

    let reviews = ReviewRepository::new(state.pool()).list().await?;
    Ok(Json(reviews))
}

/// Retrieve a review by id.
pub async fn retrieve(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
) -> Result<Json<Review>> {
    ensure_allowed(&auth.0.actor(), Action::Retrieve, Resource::Review)?;

    let review = ReviewRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("review {id}")))?;

    Ok(Json(review))
}

/// Create a review authored by the acting user.
pub async fn create(
    auth: RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    ensure_allowed(&auth.0.actor(), Action::Create, Resource::Review)?;
    let author = auth.0.id;

    let input = validate(&body)?;
    let review = ReviewRepository::new(state.pool())
        .create(author, &input)
        .await
        .map_err(fk_to_field_error)?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Update a review's payload fields. The author never changes.
pub async fn update(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<Review>> {
    ensure_allowed(&auth.0.actor(), Action::Update, Resource::Review)?;

    let input = validate(&body)?;
    let review = ReviewRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(fk_to_field_error)?;

    Ok(Json(review))
}

/// Delete a review.
pub async fn destroy(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode> {
    ensure_allowed(&auth.0.actor(), Action::Delete, Resource::Review)?;

    let deleted = ReviewRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("review {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rating: i32, comment: &str) -> ReviewRequest {
        ReviewRequest {
            product: ProductId::new(1),
            rating,
            comment: comment.to_owned(),
        }
    }

    #[test]
    fn rating_must_be_one_through_five() {
        assert!(validate(&request(0, "fine")).is_err());
        assert!(validate(&request(6, "fine")).is_err());
        assert!(validate(&request(1, "fine")).is_ok());
        assert!(validate(&request(5, "fine")).is_ok());
    }

    #[test]
    fn comment_is_required() {
        assert!(validate(&request(4, "   ")).is_err());
        assert!(validate(&request(4, "Great product!")).is_ok());
    }

    #[test]
    fn payload_has_no_author_field() {
        // Deserializing a payload that tries to smuggle an author works, but
        // the field is simply not part of the struct.
        let body: ReviewRequest = serde_json::from_str(
            r#"{"product": 1, "rating": 5, "comment": "Great product!", "user": 999}"#,
        )
        .expect("extra fields are ignored");
        assert_eq!(body.product, ProductId::new(1));
    }
}
