//! Fashion Store Core - Shared types and cart logic.
//!
//! This crate provides the pieces used across all Fashion Store components:
//! - `storefront` - Public shop, cart and sign-in
//! - `admin` - Dashboard, product and order management
//! - `cli` - Catalog seeding and reporting
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, statuses
//!   and identities
//! - [`cart`] - The shopping cart state container

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartItem};
pub use types::*;
