//! Identity extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use fashion_store_session::current_user;

use crate::models::CurrentUser;

/// Extractor that optionally gets the signed-in user.
///
/// Never rejects: anonymous visitors and users whose token has expired both
/// come through as `None`.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Bonjour, {}!", u.identity.email),
///         None => "Bonjour!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => current_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}
