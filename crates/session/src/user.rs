//! The signed-in identity kept in a session.
//!
//! Both services sign users in against the hosted auth service and keep the
//! resulting identity and access token in the session. Role checks happen in
//! each service's extractors.

use chrono::{DateTime, Utc};
use fashion_store_core::{Email, Identity};
use fashion_store_data::{AuthSession, DataClient, DataError};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key of the signed-in user.
pub const CURRENT_USER_KEY: &str = "current_user";

/// Session-stored identity and access token.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub identity: Identity,
    access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CurrentUser {
    #[must_use]
    pub fn from_auth(auth: AuthSession) -> Self {
        Self {
            access_token: auth.access_token.expose_secret().to_string(),
            identity: auth.identity,
            expires_at: auth.expires_at,
        }
    }

    /// The bearer token for calls made on behalf of this user.
    #[must_use]
    pub fn access_token(&self) -> SecretString {
        SecretString::from(self.access_token.clone())
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity.is_admin()
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Data client acting as this user, so the service's row policies apply.
    #[must_use]
    pub fn data(&self, client: &DataClient) -> DataClient {
        client.as_user(&self.access_token())
    }
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("identity", &self.identity)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Errors from signing in or out.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Store(#[from] tower_sessions::session::Error),
}

/// Signed-in user from the session, ignoring expired tokens.
pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(CURRENT_USER_KEY)
        .await
        .ok()
        .flatten()
        .filter(|user| !user.is_expired(Utc::now()))
}

/// Sign in with the auth service and keep the identity in the session.
///
/// The session ID is cycled so a pre-login session cannot be reused; other
/// session values (such as a cart) survive the cycle.
///
/// # Errors
///
/// Returns [`DataError::InvalidCredentials`] for a bad pair, or any other
/// auth service or session store error.
pub async fn sign_in(
    session: &Session,
    data: &DataClient,
    email: &Email,
    password: &SecretString,
) -> Result<CurrentUser, SessionError> {
    let auth = data.sign_in_with_password(email, password).await?;
    let user = CurrentUser::from_auth(auth);

    session.cycle_id().await?;
    session.insert(CURRENT_USER_KEY, &user).await?;

    Ok(user)
}

/// Revoke the token, then forget the identity.
///
/// If the auth service call fails the session is left as it was and the
/// user stays signed in.
///
/// # Errors
///
/// Returns the auth service or session store error.
pub async fn sign_out(
    session: &Session,
    data: &DataClient,
    user: &CurrentUser,
) -> Result<(), SessionError> {
    data.sign_out(&user.access_token()).await?;
    session.remove::<CurrentUser>(CURRENT_USER_KEY).await?;
    Ok(())
}
