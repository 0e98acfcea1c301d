//! Sign-in and sign-out route handlers.
//!
//! Passwords are checked by the hosted auth service; the storefront only
//! keeps the resulting identity and access token in the session.

use askama::Template;
use askama_web::WebTemplate;
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
use tracing::instrument;

use super::Layout;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, SessionCart};
use crate::models::Flash;
use crate::models::session::{self, SessionError, set_flash};
use crate::state::AppState;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
}

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    cart: SessionCart,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        layout: Layout::new(&state, None, &cart).await,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle a sign-in attempt.
#[instrument(skip(state, cart, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    cart: SessionCart,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let rerender = |status: StatusCode, message: &str, layout: Layout| {
        (
            status,
            LoginTemplate {
                layout,
                email: form.email.clone(),
                error: Some(message.to_string()),
            },
        )
            .into_response()
    };

    let Ok(email) = Email::parse(&form.email) else {
        let layout = Layout::new(&state, None, &cart).await;
        return Ok(rerender(
            StatusCode::BAD_REQUEST,
            "Adresse email invalide",
            layout,
        ));
    };

    let password = SecretString::from(form.password.clone());
    match session::sign_in(cart.session(), state.data(), &email, &password).await {
        Ok(user) => {
            set_sentry_user(&user.identity.user_id, Some(user.identity.email.as_str()));
            set_flash(cart.session(), Flash::success("Connexion réussie")).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(SessionError::Data(DataError::InvalidCredentials)) => {
            let layout = Layout::new(&state, None, &cart).await;
            Ok(rerender(
                StatusCode::UNAUTHORIZED,
                "Email ou mot de passe incorrect",
                layout,
            ))
        }
        Err(SessionError::Data(e)) => {
            tracing::error!(error = %e, "Sign-in failed");
            let layout = Layout::new(&state, None, &cart).await;
            Ok(rerender(
                StatusCode::BAD_GATEWAY,
                "Service d'authentification indisponible, réessayez plus tard",
                layout,
            ))
        }
        Err(SessionError::Store(e)) => Err(e.into()),
    }
}

/// Handle sign-out.
///
/// If the auth service cannot revoke the token the visitor stays signed in
/// and is told so.
#[instrument(skip(state, user, cart))]
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    cart: SessionCart,
) -> Result<Redirect> {
    let Some(user) = user else {
        return Ok(Redirect::to("/"));
    };

    let flash = match session::sign_out(cart.session(), state.data(), &user).await {
        Ok(()) => {
            clear_sentry_user();
            Flash::info("Vous êtes déconnecté")
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-out failed, session kept");
            Flash::error("La déconnexion a échoué, réessayez")
        }
    };

    set_flash(cart.session(), flash).await?;
    Ok(Redirect::to("/"))
}
