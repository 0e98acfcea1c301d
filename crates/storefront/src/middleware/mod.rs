//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store)
//! 5. Security headers (CSP, frame denial, etc.)
//!
//! Extractors for the signed-in user and the cart read the session that the
//! session layer places in the request extensions.

pub mod auth;
pub mod cart;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::OptionalAuth;
pub use cart::SessionCart;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
