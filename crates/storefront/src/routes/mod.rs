//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Shop listing (?category=<uuid>)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (data service reachable)
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add one unit of a product variant
//! POST /cart/update            - Set a line's quantity (<= 0 removes)
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! POST /checkout               - Not available yet, keeps the cart
//!
//! # Auth
//! GET  /auth/login             - Sign-in page
//! POST /auth/login             - Sign-in action
//! POST /auth/logout            - Sign-out action
//! ```

pub mod auth;
pub mod cart;
pub mod home;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::middleware::SessionCart;
use crate::models::{CurrentUser, Flash, session::take_flash};
use crate::state::AppState;

/// Data shared by every full page: header badge, signed-in user, notice.
pub struct Layout {
    pub cart_count: u64,
    pub user_email: Option<String>,
    pub is_admin: bool,
    pub admin_url: Option<String>,
    pub flash: Option<Flash>,
}

impl Layout {
    /// Build the layout for this request, consuming any pending notice.
    pub async fn new(state: &AppState, user: Option<&CurrentUser>, cart: &SessionCart) -> Self {
        Self {
            cart_count: cart.cart.total_items(),
            user_email: user.map(|u| u.identity.email.to_string()),
            is_admin: user.is_some_and(CurrentUser::is_admin),
            admin_url: state.config().admin_url.clone(),
            flash: take_flash(cart.session()).await,
        }
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::shop))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .nest("/auth", auth_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the data service does not answer.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.data().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
