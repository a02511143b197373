//! Staff status management.
//!
//! The API never exposes the staff flag; granting and revoking it happens
//! here, against existing accounts.

use bramble_api::db::{RepositoryError, UserRepository};

use super::{CommandError, connect};

/// Set or clear the staff flag on the named account.
///
/// # Errors
///
/// Returns `CommandError::UnknownUser` when no account has that username.
pub async fn set_staff(username: &str, is_staff: bool) -> Result<(), CommandError> {
    let pool = connect().await?;

    match UserRepository::new(&pool).set_staff(username, is_staff).await {
        Ok(()) => {
            if is_staff {
                tracing::info!("{username} is now staff");
            } else {
                tracing::info!("{username} is no longer staff");
            }
            Ok(())
        }
        Err(RepositoryError::NotFound) => Err(CommandError::UnknownUser(username.to_owned())),
        Err(e) => Err(e.into()),
    }
}
