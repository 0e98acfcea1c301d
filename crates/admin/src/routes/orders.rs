//! Orders management route handlers.
//!
//! The listing loads every order newest first, then fans out for each
//! order's customer and items and for the products those items reference.
//! Lookups run concurrently with a bounded number in flight.

use std::collections::{HashMap, HashSet};

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, Redirect},
};
use fashion_store_core::{OrderId, OrderStatus, ProductId};
use fashion_store_data::{Customer, DataClient, Order, OrderItem, Product};
use futures::{StreamExt, stream};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminLayout, render};
use crate::{
    error::{AppError, Result},
    filters,
    middleware::RequireAdmin,
    models::{Flash, session::set_flash},
    state::AppState,
};

/// Most data service lookups in flight at once for one page.
const MAX_IN_FLIGHT: usize = 8;

const UNKNOWN_CUSTOMER: &str = "Client inconnu";
const UNKNOWN_PRODUCT: &str = "Produit inconnu";

/// An order with everything the page shows about it.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub customer: Option<Customer>,
    pub items: Vec<OrderItem>,
}

/// Status choice in the per-order select.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Order line view.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub product_name: String,
    pub size: String,
    pub color: String,
    pub quantity: i32,
    pub price: String,
}

/// Order view for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: String,
    pub total: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub statuses: Vec<StatusOption>,
    pub created_at: String,
    pub lines: Vec<OrderLineView>,
}

impl OrderView {
    fn new(detail: &OrderDetail, products: &HashMap<ProductId, Product>) -> Self {
        let order = &detail.order;
        let (customer_name, customer_email) = detail.customer.as_ref().map_or_else(
            || (UNKNOWN_CUSTOMER.to_string(), String::new()),
            |c| (c.name.clone(), c.email.clone()),
        );

        Self {
            id: order.id.to_string(),
            customer_name,
            customer_email,
            shipping_address: order.shipping_address.clone(),
            total: order.total_amount.to_string(),
            status_label: order.status.label(),
            status_class: order.status.badge_class(),
            statuses: OrderStatus::ALL
                .into_iter()
                .map(|status| StatusOption {
                    value: status.as_str(),
                    label: status.label(),
                    selected: status == order.status,
                })
                .collect(),
            created_at: order.created_at.format("%d/%m/%Y %H:%M").to_string(),
            lines: detail
                .items
                .iter()
                .map(|item| OrderLineView {
                    product_name: item
                        .product_id
                        .and_then(|id| products.get(&id))
                        .map_or_else(|| UNKNOWN_PRODUCT.to_string(), |p| p.name.clone()),
                    size: item.size.clone(),
                    color: item.color.clone(),
                    quantity: item.quantity,
                    price: item.price.to_string(),
                })
                .collect(),
        }
    }
}

/// Orders page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: AdminLayout,
    pub orders: Vec<OrderView>,
}

/// Status update form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Load the customer and items of one order. A failed lookup shows up as
/// an unknown customer or an order without lines.
async fn load_detail(data: &DataClient, order: Order) -> OrderDetail {
    let order_id = order.id;
    let customer_id = order.customer_id;
    let customer = async {
        match customer_id {
            Some(id) => data.get_customer(id).await,
            None => Ok(None),
        }
    };
    let (customer, items) = tokio::join!(customer, data.list_order_items(order_id));

    OrderDetail {
        customer: customer.unwrap_or_else(|e| {
            tracing::warn!(%order_id, error = %e, "Failed to fetch customer");
            None
        }),
        items: items.unwrap_or_else(|e| {
            tracing::warn!(%order_id, error = %e, "Failed to fetch order items");
            Vec::new()
        }),
        order,
    }
}

/// Fetch every product referenced by `details`, once each.
async fn load_products(data: &DataClient, details: &[OrderDetail]) -> HashMap<ProductId, Product> {
    let ids: HashSet<ProductId> = details
        .iter()
        .flat_map(|d| d.items.iter().filter_map(|item| item.product_id))
        .collect();

    stream::iter(ids)
        .map(|id| data.get_product(id))
        .buffer_unordered(MAX_IN_FLIGHT)
        .filter_map(|result| async move {
            result
                .map_err(|e| tracing::warn!(error = %e, "Failed to fetch product"))
                .ok()
                .flatten()
        })
        .map(|product| (product.id, product))
        .collect()
        .await
}

/// Orders page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let data = admin.data(state.data());

    let orders = data.list_orders().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch orders");
        Vec::new()
    });

    let details: Vec<OrderDetail> = stream::iter(orders)
        .map(|order| load_detail(&data, order))
        .buffered(MAX_IN_FLIGHT)
        .collect()
        .await;
    let products = load_products(&data, &details).await;

    render(&OrdersIndexTemplate {
        layout: AdminLayout::new(&state, &admin, &session, "/orders").await,
        orders: details
            .iter()
            .map(|detail| OrderView::new(detail, &products))
            .collect(),
    })
}

/// POST /orders/{id}/status
///
/// Redirects back to the listing, which refetches everything.
#[instrument(skip(admin, state, session))]
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status: OrderStatus = form.status.parse().map_err(AppError::BadRequest)?;

    let flash = match admin.data(state.data()).update_order_status(id, status).await {
        Ok(_) => Flash::success(format!("Statut mis à jour : {}", status.label())),
        Err(e) => {
            tracing::error!(order_id = %id, error = %e, "Failed to update order status");
            Flash::error("Impossible de mettre à jour le statut")
        }
    };

    set_flash(&session, flash).await?;
    Ok(Redirect::to("/orders"))
}
