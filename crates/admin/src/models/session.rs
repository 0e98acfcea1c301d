//! Session-related types for admin authentication.
//!
//! Anyone with an account can sign in here; the admin role is checked on
//! every dashboard route by [`crate::middleware::RequireAdmin`].

pub use fashion_store_session::{CurrentUser, SessionError, sign_in, sign_out};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the one-shot notice shown on the next page.
    pub const FLASH: &str = "flash";
}

/// A one-shot notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub is_error: bool,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            is_error: false,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        if self.is_error {
            "flash flash-error"
        } else {
            "flash flash-success"
        }
    }
}

/// Queue a notice for the next page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::FLASH, flash).await
}

/// Take the pending notice, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session.remove::<Flash>(keys::FLASH).await.ok().flatten()
}
