//! Session plumbing shared by the storefront and the admin dashboard.
//!
//! - [`SessionCache`]: a bounded in-memory session store that evicts records
//!   once they expire.
//! - [`CurrentUser`]: the signed-in identity kept in a session, with
//!   [`sign_in`] and [`sign_out`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod store;
pub mod user;

pub use store::SessionCache;
pub use user::{CURRENT_USER_KEY, CurrentUser, SessionError, current_user, sign_in, sign_out};
