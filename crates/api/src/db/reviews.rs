//! Review repository for database operations.

use bramble_core::{ProductId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::review::Review;

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    product_name: String,
    user_id: i32,
    username: String,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            user_id: UserId::new(row.user_id),
            username: row.username,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_REVIEW: &str = "SELECT r.id, r.product_id, p.name AS product_name, \
            r.user_id, u.username, r.rating, r.comment, r.created_at, r.updated_at \
     FROM review r \
     JOIN product p ON p.id = r.product_id \
     JOIN app_user u ON u.id = r.user_id";

/// Fields a review payload may set. The author is supplied separately by the
/// handler from the authenticated actor, never from the payload.
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub product: ProductId,
    pub rating: i32,
    pub comment: String,
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all reviews, product and author joined.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!("{SELECT_REVIEW} ORDER BY r.id"))
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a review by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!("{SELECT_REVIEW} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Create a review authored by `author`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        author: UserId,
        input: &ReviewInput,
    ) -> Result<Review, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO review (product_id, user_id, rating, comment) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(input.product)
        .bind(author)
        .bind(input.rating)
        .bind(&input.comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_write_error(e, "duplicate review", "unknown product")
        })?;

        self.get(ReviewId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a review's payload fields. The author is preserved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    /// Returns `RepositoryError::ForeignKey` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ReviewId,
        input: &ReviewInput,
    ) -> Result<Review, RepositoryError> {
        let result = sqlx::query(
            "UPDATE review SET product_id = $2, rating = $3, comment = $4, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.product)
        .bind(input.rating)
        .bind(&input.comment)
        .execute(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_write_error(e, "duplicate review", "unknown product")
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a review. Returns `true` if the row existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ReviewId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM review WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
