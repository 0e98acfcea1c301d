//! Cart extractor.
//!
//! Loads the visitor's cart from the session. Handlers mutate the loaded
//! copy and call [`SessionCart::save`] to write it back.

use axum::{extract::FromRequestParts, http::request::Parts};
use fashion_store_core::Cart;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// The visitor's cart together with the session it came from.
pub struct SessionCart {
    session: Session,
    pub cart: Cart,
}

impl SessionCart {
    /// Persist the (possibly modified) cart in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(session_keys::CART, &self.cart).await
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

impl<S> FromRequestParts<S> for SessionCart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        // Unreadable carts start over empty.
        let cart = match session.get::<Cart>(session_keys::CART).await {
            Ok(cart) => cart.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable cart");
                Cart::default()
            }
        };

        Ok(Self { session, cart })
    }
}
