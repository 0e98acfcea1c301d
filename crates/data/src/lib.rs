//! Fashion Store Data - client for the hosted data service.
//!
//! # Architecture
//!
//! - The hosted service is the source of truth: every read goes over the
//!   wire, nothing is cached between calls
//! - Tables are exposed through a PostgREST-style REST surface
//!   (`/rest/v1/{table}`), authentication through a token service
//!   (`/auth/v1/...`)
//! - Requests carry the project API key; calls made on behalf of a signed-in
//!   user also carry that user's access token so row policies apply
//!
//! # Example
//!
//! ```rust,ignore
//! use fashion_store_data::{DataClient, DataServiceConfig};
//!
//! let client = DataClient::new(&config)?;
//!
//! // Shop listing for one category
//! let products = client.list_products(Some(category_id)).await?;
//!
//! // Admin mutation with the admin's own token
//! client.as_user(&token).update_order_status(order_id, OrderStatus::Shipped).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod auth;
mod catalog;
mod client;
mod orders;
pub mod query;
pub mod types;

pub use auth::AuthSession;
pub use client::{DataClient, DataServiceConfig};
pub use query::{Direction, Query, Table};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the data service.
#[derive(Debug, Error)]
pub enum DataError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error body.
    #[error("API error: {status} {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Missing or rejected API key / access token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Email/password pair was rejected at sign-in.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Table or row not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A single-row read matched more than one row.
    #[error("Expected at most one row from {table}, got {count}")]
    MultipleRows { table: &'static str, count: usize },

    /// Update or delete issued without any filter.
    #[error("Refusing to {operation} every row of {table}")]
    MissingFilter {
        operation: &'static str,
        table: &'static str,
    },

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body or header could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured service URL is unusable.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl DataError {
    /// Whether the error came from the remote service or the network, as
    /// opposed to a local misuse.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        !matches!(self, Self::MissingFilter { .. } | Self::InvalidUrl(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataError::Api {
            status: 400,
            code: "22P02".to_string(),
            message: "invalid input syntax for type uuid".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error: 400 22P02 - invalid input syntax for type uuid"
        );

        let err = DataError::MultipleRows {
            table: "customers",
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "Expected at most one row from customers, got 2"
        );
    }

    #[test]
    fn test_is_upstream() {
        assert!(DataError::Unauthorized.is_upstream());
        assert!(DataError::RateLimited(3).is_upstream());
        assert!(
            !DataError::MissingFilter {
                operation: "delete",
                table: "products"
            }
            .is_upstream()
        );
    }
}
