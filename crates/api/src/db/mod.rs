//! Database operations for the API `PostgreSQL` instance.
//!
//! ## Tables
//!
//! - `app_user` - Accounts (username, argon2 password hash, staff flag)
//! - `api_token` - Bearer tokens issued at login
//! - `category` - Product categories
//! - `product` - The catalog
//! - `orders` / `order_item` - Orders and their product lines
//! - `review` - Product reviews
//!
//! All queries go through the runtime sqlx API (`query_as`, `QueryBuilder`)
//! so the crate builds without a live database or offline query cache.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p bramble-cli -- migrate
//! ```

pub mod categories;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod tokens;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use orders::{NewOrderItem, OrderRepository};
pub use products::{ProductInput, ProductOrdering, ProductQuery, ProductRepository};
pub use reviews::{ReviewInput, ReviewRepository};
pub use tokens::TokenRepository;
pub use users::{UserChanges, UserRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique-constraint violation (e.g., duplicate username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A referenced row does not exist (dangling foreign key in a payload).
    #[error("unknown reference: {0}")]
    ForeignKey(String),
}

impl RepositoryError {
    /// Translate a sqlx error into `Conflict`/`ForeignKey` where the
    /// underlying constraint makes the cause clear.
    pub(crate) fn from_write_error(err: sqlx::Error, conflict: &str, reference: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(conflict.to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::ForeignKey(reference.to_owned());
            }
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
