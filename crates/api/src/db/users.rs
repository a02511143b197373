//! User repository for database operations.

use bramble_core::{Scope, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::user::User;

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: Option<String>,
    is_staff: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            username: row.username,
            email: row.email,
            is_staff: row.is_staff,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_USER: &str = "SELECT id, username, email, is_staff, created_at, updated_at \
     FROM app_user";

/// Field changes for a user update. `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<Option<String>>,
    pub password_hash: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the users visible under the given scope.
    ///
    /// Staff see all users; a customer scope narrows the result to their own
    /// row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, scope: Scope) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = match scope {
            Scope::Everything => {
                sqlx::query_as(&format!("{SELECT_USER} ORDER BY id"))
                    .fetch_all(self.pool)
                    .await?
            }
            Scope::Mine(user_id) => {
                sqlx::query_as(&format!("{SELECT_USER} WHERE id = $1 ORDER BY id"))
                    .bind(user_id)
                    .fetch_all(self.pool)
                    .await?
            }
            Scope::Nothing => Vec::new(),
        };

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a user by id, honoring the visibility scope.
    ///
    /// A row outside the scope reads as absent so that existence never leaks
    /// across accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, scope: Scope, id: UserId) -> Result<Option<User>, RepositoryError> {
        match scope {
            Scope::Mine(own) if own != id => return Ok(None),
            Scope::Nothing => return Ok(None),
            Scope::Everything | Scope::Mine(_) => {}
        }

        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new user account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &str,
        email: Option<&str>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO app_user (username, email, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING id, username, email, is_staff, created_at, updated_at",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_write_error(e, "username already exists", "unknown reference")
        })?;

        Ok(row.into())
    }

    /// Apply a partial update to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new username is taken.
    pub async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            "UPDATE app_user SET \
                 username = COALESCE($2, username), \
                 email = CASE WHEN $3 THEN $4 ELSE email END, \
                 password_hash = COALESCE($5, password_hash), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING id, username, email, is_staff, created_at, updated_at",
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.email.is_some())
        .bind(changes.email.flatten())
        .bind(changes.password_hash)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_write_error(e, "username already exists", "unknown reference")
        })?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Set or clear the staff flag on an account (CLI only; the API never
    /// exposes this).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such username exists.
    pub async fn set_staff(&self, username: &str, is_staff: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE app_user SET is_staff = $2, updated_at = now() WHERE username = $1",
        )
        .bind(username)
        .bind(is_staff)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a user account.
    ///
    /// Returns `true` if the row existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM app_user WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a user and their password hash by username, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_auth_by_username(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<(i32, String, Option<String>, bool, DateTime<Utc>, DateTime<Utc>, String)> =
            sqlx::query_as(
                "SELECT id, username, email, is_staff, created_at, updated_at, password_hash \
                 FROM app_user WHERE username = $1",
            )
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(
            |(id, username, email, is_staff, created_at, updated_at, password_hash)| {
                (
                    User {
                        id: UserId::new(id),
                        username,
                        email,
                        is_staff,
                        created_at,
                        updated_at,
                    },
                    password_hash,
                )
            },
        ))
    }
}
