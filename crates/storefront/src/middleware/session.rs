//! Session middleware configuration.
//!
//! Sessions live in process memory: the cart and the signed-in identity are
//! lost on restart.

use fashion_store_session::SessionCache;
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "fs_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Upper bound on live sessions held in memory.
const MAX_SESSIONS: u64 = 100_000;

/// Create the session layer with a bounded in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<SessionCache> {
    SessionManagerLayer::new(SessionCache::new(MAX_SESSIONS))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
