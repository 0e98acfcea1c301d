//! Authentication extractors for admin.
//!
//! Every dashboard route requires a signed-in user holding the admin role.
//! Anonymous visitors are sent to the sign-in page; signed-in customers get
//! a 403 page.

use askama::Template;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use fashion_store_session::current_user;
use tower_sessions::Session;

use crate::filters;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Extractor that requires an admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Bonjour, {}!", admin.identity.email)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when a route needs an admin.
pub enum AdminAuthRejection {
    /// Not signed in (or the token expired).
    RedirectToLogin,
    /// Signed in without the admin role.
    Forbidden {
        email: String,
        storefront_url: Option<String>,
    },
    /// The session layer is missing.
    MissingSession,
}

/// Access denied page.
#[derive(Template)]
#[template(path = "forbidden.html")]
struct ForbiddenTemplate {
    email: String,
    storefront_url: Option<String>,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Forbidden {
                email,
                storefront_url,
            } => {
                let page = ForbiddenTemplate {
                    email,
                    storefront_url,
                }
                .render()
                .unwrap_or_else(|e| {
                    tracing::error!("Template render error: {}", e);
                    "Accès refusé".to_string()
                });
                (StatusCode::FORBIDDEN, Html(page)).into_response()
            }
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::MissingSession)?;

        let user = current_user(session)
            .await
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.identity.user_id, "Non-admin denied");
            let state = AppState::from_ref(state);
            return Err(AdminAuthRejection::Forbidden {
                email: user.identity.email.to_string(),
                storefront_url: state.config().storefront_url.clone(),
            });
        }

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the signed-in user, admin or not.
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
