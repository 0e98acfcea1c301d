//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (data service reachable)
//!
//! # Dashboard
//! GET  /                            - Overview stats and recent orders
//!
//! # Products
//! GET  /products                    - Product listing
//! GET  /products/new                - New product form
//! POST /products/new                - Create product
//! GET  /products/{id}/edit          - Edit product form
//! POST /products/{id}/edit          - Update product
//! POST /products/{id}/delete        - Delete product
//!
//! # Orders
//! GET  /orders                      - Orders with customer and items
//! POST /orders/{id}/status          - Change an order's status
//!
//! # Auth
//! GET  /auth/login                  - Sign-in page
//! POST /auth/login                  - Sign-in action
//! POST /auth/logout                 - Sign-out action
//! ```
//!
//! Every route except health and auth requires the admin role.

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;

use askama::Template;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, Flash, session::take_flash};
use crate::state::AppState;

/// Signed-in admin and navigation data shared by every dashboard page.
pub struct AdminLayout {
    pub email: String,
    pub current_path: &'static str,
    pub storefront_url: Option<String>,
    pub flash: Option<Flash>,
}

impl AdminLayout {
    /// Build the layout, consuming any pending notice.
    pub async fn new(
        state: &AppState,
        admin: &CurrentUser,
        session: &Session,
        current_path: &'static str,
    ) -> Self {
        Self {
            email: admin.identity.email.to_string(),
            current_path,
            storefront_url: state.config().storefront_url.clone(),
            flash: take_flash(session).await,
        }
    }
}

/// Render a template, falling back to a bare error page.
pub fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Erreur interne du serveur".to_string()
    }))
}

/// Create all routes for the admin dashboard.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/", get(dashboard::dashboard))
        .route("/products", get(products::index))
        .route("/products/new", get(products::new_form).post(products::create))
        .route(
            "/products/{id}/edit",
            get(products::edit_form).post(products::update),
        )
        .route("/products/{id}/delete", post(products::delete))
        .route("/orders", get(orders::index))
        .route("/orders/{id}/status", post(orders::update_status))
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/logout", post(auth::logout))
}

async fn health() -> &'static str {
    "ok"
}

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
