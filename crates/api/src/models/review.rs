//! Review domain models.

use bramble_core::{ProductId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A product review.
///
/// The author is always the actor who created the review; it is set
/// server-side and never taken from a payload.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub product_name: String,
    pub user_id: UserId,
    pub username: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
