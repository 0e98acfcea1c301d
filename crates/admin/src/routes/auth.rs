//! Authentication route handlers for admin.
//!
//! Email and password are checked by the hosted auth service. Signing in
//! does not require the admin role; the dashboard routes check it.

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use fashion_store_core::Email;
use fashion_store_data::DataError;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::render;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{
    Flash,
    session::{self, SessionError, set_flash, take_flash},
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
    pub flash: Option<Flash>,
}

/// GET /auth/login
pub async fn login_page(OptionalAuth(user): OptionalAuth, session: Session) -> Response {
    if user.is_some_and(|u| u.is_admin()) {
        return Redirect::to("/").into_response();
    }

    render(&LoginTemplate {
        email: String::new(),
        error: None,
        flash: take_flash(&session).await,
    })
    .into_response()
}

/// POST /auth/login
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let rejected = |status: StatusCode, message: &str| {
        (
            status,
            render(&LoginTemplate {
                email: form.email.clone(),
                error: Some(message.to_string()),
                flash: None,
            }),
        )
            .into_response()
    };

    let Ok(email) = Email::parse(&form.email) else {
        return Ok(rejected(StatusCode::BAD_REQUEST, "Adresse email invalide"));
    };

    let password = SecretString::from(form.password.clone());
    match session::sign_in(&session, state.data(), &email, &password).await {
        Ok(user) => {
            set_sentry_user(&user.identity.user_id, Some(user.identity.email.as_str()));
            tracing::info!(admin = user.is_admin(), "Signed in");
            Ok(Redirect::to("/").into_response())
        }
        Err(SessionError::Data(DataError::InvalidCredentials)) => Ok(rejected(
            StatusCode::UNAUTHORIZED,
            "Email ou mot de passe incorrect",
        )),
        Err(SessionError::Data(e)) => {
            tracing::error!(error = %e, "Sign-in failed");
            Ok(rejected(
                StatusCode::BAD_GATEWAY,
                "Service d'authentification indisponible, réessayez plus tard",
            ))
        }
        Err(SessionError::Store(e)) => Err(e.into()),
    }
}

/// POST /auth/logout
///
/// A failed revocation keeps the user signed in and says so.
#[instrument(skip(state, user, session))]
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<Redirect> {
    let Some(user) = user else {
        return Ok(Redirect::to("/auth/login"));
    };

    match session::sign_out(&session, state.data(), &user).await {
        Ok(()) => {
            clear_sentry_user();
            set_flash(&session, Flash::success("Vous êtes déconnecté")).await?;
            Ok(Redirect::to("/auth/login"))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-out failed, session kept");
            set_flash(&session, Flash::error("La déconnexion a échoué, réessayez")).await?;
            Ok(Redirect::to(if user.is_admin() { "/" } else { "/auth/login" }))
        }
    }
}
