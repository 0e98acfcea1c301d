//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use fashion_store_core::Price;
use fashion_store_data::{DataError, Order};
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminLayout, render};
use crate::{filters, middleware::RequireAdmin, state::AppState};

/// Number of orders shown under "Commandes Récentes".
const RECENT_ORDERS: usize = 5;

/// Overview figures. Each one falls back to zero when its fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub revenue: Price,
    pub orders: u64,
    pub products: u64,
    pub customers: u64,
}

impl DashboardStats {
    /// Combine the results of the overview fetches.
    #[must_use]
    pub fn collect(
        totals: Result<Vec<Price>, DataError>,
        orders: Result<u64, DataError>,
        products: Result<u64, DataError>,
        customers: Result<u64, DataError>,
    ) -> Self {
        Self {
            revenue: or_default(totals, "order totals").into_iter().sum(),
            orders: or_default(orders, "order count"),
            products: or_default(products, "product count"),
            customers: or_default(customers, "customer count"),
        }
    }
}

fn or_default<T: Default>(result: Result<T, DataError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch {what}");
        T::default()
    })
}

/// Recent order row.
#[derive(Debug, Clone)]
pub struct RecentOrderView {
    pub id: String,
    pub total: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub created_at: String,
}

impl From<&Order> for RecentOrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            total: order.total_amount.to_string(),
            status_label: order.status.label(),
            status_class: order.status.badge_class(),
            created_at: order.created_at.format("%d/%m/%Y").to_string(),
        }
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: AdminLayout,
    pub stats: DashboardStats,
    pub recent_orders: Vec<RecentOrderView>,
}

/// Dashboard page handler.
///
/// The five fetches are issued concurrently.
#[instrument(skip(admin, state, session))]
pub async fn dashboard(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let data = admin.data(state.data());

    let (totals, orders, products, customers, recent) = tokio::join!(
        data.order_totals(),
        data.count_orders(),
        data.count_products(),
        data.count_customers(),
        data.recent_orders(RECENT_ORDERS),
    );

    let stats = DashboardStats::collect(totals, orders, products, customers);
    let recent_orders = or_default(recent, "recent orders")
        .iter()
        .map(RecentOrderView::from)
        .collect();

    render(&DashboardTemplate {
        layout: AdminLayout::new(&state, &admin, &session, "/").await,
        stats,
        recent_orders,
    })
}
