//! Auth service calls: password sign-in, user lookup and sign-out.

use chrono::{DateTime, TimeDelta, Utc};
use fashion_store_core::{Email, Identity, Role, UserId};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{DataClient, DataError};

/// A successful password sign-in.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Bearer token for calls made on behalf of this user.
    pub access_token: SecretString,
    /// When the access token stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// Who signed in.
    pub identity: Identity,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: AuthUser,
}

/// Absolute expiry of a token issued at `now` for `expires_in` seconds.
fn expiry_from(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>, DataError> {
    TimeDelta::try_seconds(expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| DataError::Parse(format!("token lifetime out of range: {expires_in}s")))
}

#[derive(Deserialize)]
struct AuthUser {
    id: UserId,
    email: Option<String>,
    #[serde(default)]
    app_metadata: AppMetadata,
}

#[derive(Default, Deserialize)]
struct AppMetadata {
    role: Option<String>,
}

impl AuthUser {
    fn into_identity(self) -> Result<Identity, DataError> {
        let email = self.email.unwrap_or_default();
        let email = Email::parse(&email)
            .map_err(|e| DataError::Parse(format!("user {} email: {e}", self.id)))?;

        Ok(Identity {
            user_id: self.id,
            email,
            role: Role::from_claim(self.app_metadata.role.as_deref()),
        })
    }
}

impl DataClient {
    /// Exchange an email and password for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidCredentials`] when the pair is rejected,
    /// or any transport/parse error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, DataError> {
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .request(Method::POST, url)
            .json(&PasswordGrant {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED
        ) {
            tracing::info!("Sign-in rejected");
            return Err(DataError::InvalidCredentials);
        }

        let token: TokenResponse = self
            .check(response)
            .await?
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("token response: {e}")))?;

        let identity = token.user.into_identity()?;
        tracing::info!(user_id = %identity.user_id, role = %identity.role, "Signed in");

        Ok(AuthSession {
            access_token: SecretString::from(token.access_token),
            expires_at: expiry_from(Utc::now(), token.expires_in)?,
            identity,
        })
    }

    /// Resolve the identity behind an access token.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Unauthorized`] when the token is expired or
    /// revoked.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &SecretString) -> Result<Identity, DataError> {
        let url = self.auth_url("user")?;
        let response = self
            .request_with_bearer(Method::GET, url, access_token)
            .send()
            .await?;

        let user: AuthUser = self
            .check(response)
            .await?
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("user response: {e}")))?;

        user.into_identity()
    }

    /// Revoke an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth service cannot be reached or refuses.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &SecretString) -> Result<(), DataError> {
        let url = self.auth_url("logout")?;
        let response = self
            .request_with_bearer(Method::POST, url, access_token)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }
}
