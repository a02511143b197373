//! Authentication extractors.
//!
//! Resolves the `Authorization: Bearer <token>` header to a [`CurrentUser`]
//! through the token repository. Absent or unknown tokens resolve to an
//! anonymous actor for [`OptionalAuth`]; [`RequireAuth`] rejects them with
//! the policy's 403.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use bramble_core::Actor;

use crate::db::TokenRepository;
use crate::error::ApiError;
use crate::models::user::CurrentUser;
use crate::state::AppState;

/// Extractor that resolves the current user if a valid token is presented.
///
/// Use this on endpoints whose policy admits anonymous actors; the policy
/// table decides what the resulting actor may do.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.username),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CurrentUser>);

impl OptionalAuth {
    /// The policy actor: anonymous when no valid token was presented.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        match &self.0 {
            Some(user) => user.actor(),
            None => Actor::Anonymous,
        }
    }
}

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };

        let user = TokenRepository::new(state.pool()).resolve(token).await?;
        Ok(Self(user))
    }
}

/// Extractor that requires an authenticated user.
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;
        user.map(Self).ok_or(ApiError::AuthRequired)
    }
}

/// Pull the bearer token out of the `Authorization` header, if any.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/products");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        let (parts, ()) = builder.body(()).expect("request build").into_parts();
        parts
    }

    #[test]
    fn extracts_bearer_token() {
        let parts = parts_with_auth(Some("Bearer abc123"));
        assert_eq!(bearer_token(&parts), Some("abc123"));
    }

    #[test]
    fn missing_header_is_anonymous() {
        let parts = parts_with_auth(None);
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn empty_token_is_ignored() {
        let parts = parts_with_auth(Some("Bearer "));
        assert_eq!(bearer_token(&parts), None);
    }
}
