//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod staff;

use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository error from the API crate.
    #[error("Repository error: {0}")]
    Repository(#[from] bramble_api::db::RepositoryError),

    /// Authentication service error while seeding accounts.
    #[error("Auth error: {0}")]
    Auth(#[from] bramble_api::services::AuthError),

    /// No user with the given username.
    #[error("No user with username: {0}")]
    UnknownUser(String),
}

/// Connect to the database named by `BRAMBLE_DATABASE_URL` (falling back
/// to `DATABASE_URL`).
///
/// # Errors
///
/// Returns `CommandError::MissingEnvVar` if neither variable is set, or a
/// database error if the connection fails.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BRAMBLE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("BRAMBLE_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(PgPool::connect(&database_url).await?)
}
