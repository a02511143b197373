//! Bearer-token repository.
//!
//! Tokens are opaque random strings issued at login and resolved on every
//! authenticated request. Resolution joins the owning user so the auth
//! middleware needs exactly one query.

use bramble_core::UserId;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::user::CurrentUser;

/// Repository for API token operations.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly issued token for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, user_id: UserId, token: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO api_token (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Resolve a bearer token to its user.
    ///
    /// Returns `None` for unknown tokens; the caller decides whether that is
    /// an anonymous actor or a rejection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn resolve(&self, token: &str) -> Result<Option<CurrentUser>, RepositoryError> {
        let row: Option<(i32, String, bool)> = sqlx::query_as(
            "SELECT u.id, u.username, u.is_staff \
             FROM api_token t \
             JOIN app_user u ON u.id = t.user_id \
             WHERE t.token = $1",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, username, is_staff)| CurrentUser {
            id: UserId::new(id),
            username,
            is_staff,
        }))
    }

    /// Revoke a token (logout). Returns `true` if the token existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn revoke(&self, token: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM api_token WHERE token = $1")
            .bind(token)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
