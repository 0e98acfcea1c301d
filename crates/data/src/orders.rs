//! Order and customer operations.

use fashion_store_core::{CustomerId, OrderId, OrderStatus, Price};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::query::{Direction, Table};
use crate::types::{Customer, Order, OrderItem};
use crate::{DataClient, DataError};

#[derive(Serialize)]
struct StatusPatch {
    status: OrderStatus,
}

#[derive(Deserialize)]
struct TotalRow {
    total_amount: Price,
}

impl DataClient {
    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, DataError> {
        self.table(Table::Orders)
            .order("created_at", Direction::Descending)
            .fetch()
            .await
    }

    /// The `limit` most recent orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn recent_orders(&self, limit: usize) -> Result<Vec<Order>, DataError> {
        self.table(Table::Orders)
            .order("created_at", Direction::Descending)
            .limit(limit)
            .fetch()
            .await
    }

    /// Total amount of every order, for revenue figures.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn order_totals(&self) -> Result<Vec<Price>, DataError> {
        let rows: Vec<TotalRow> = self
            .table(Table::Orders)
            .select("total_amount")
            .fetch()
            .await?;
        Ok(rows.into_iter().map(|row| row.total_amount).collect())
    }

    /// Set the status of an order and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if no order has this ID.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, DataError> {
        let rows: Vec<Order> = self
            .table(Table::Orders)
            .eq("id", id)
            .update(&StatusPatch { status })
            .await?;

        let order = rows
            .into_iter()
            .next()
            .ok_or_else(|| DataError::NotFound(format!("order {id}")))?;
        tracing::info!(order_id = %id, status = %status, "Order status updated");
        Ok(order)
    }

    /// Lines of one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, DataError> {
        self.table(Table::OrderItems)
            .eq("order_id", order_id)
            .fetch()
            .await
    }

    /// A single customer, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, DataError> {
        self.table(Table::Customers).eq("id", id).maybe_single().await
    }

    /// Number of customers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn count_customers(&self) -> Result<u64, DataError> {
        self.table(Table::Customers).count().await
    }

    /// Number of orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn count_orders(&self) -> Result<u64, DataError> {
        self.table(Table::Orders).count().await
    }
}
