//! Session-stored models for admin.

pub mod session;

pub use session::{CurrentUser, Flash, keys as session_keys};
