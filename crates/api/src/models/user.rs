//! User domain models.

use bramble_core::{Actor, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A registered user account.
///
/// The password hash never leaves the database layer; this struct is safe to
/// serialize in responses.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The authenticated user resolved from a bearer token.
///
/// Carried through handlers instead of a full [`User`] row to keep the auth
/// lookup to the columns access decisions actually need.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub is_staff: bool,
}

impl CurrentUser {
    /// The policy actor for this user.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor::Authenticated {
            id: self.id,
            is_staff: self.is_staff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_user_maps_to_authenticated_actor() {
        let user = CurrentUser {
            id: UserId::new(4),
            username: "ada".to_owned(),
            is_staff: true,
        };
        let actor = user.actor();
        assert_eq!(actor.user_id(), Some(UserId::new(4)));
        assert!(actor.is_staff());
    }
}
