//! Database migration command.
//!
//! Applies the migrations embedded from `crates/api/migrations/` to the
//! database named by `BRAMBLE_DATABASE_URL`.

use super::{CommandError, connect};

/// Run all pending database migrations.
///
/// # Errors
///
/// Fails when the database is unreachable or a migration cannot be applied.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
