//! The signed-in user as seen by the application.

use serde::{Deserialize, Serialize};

use super::{Email, Role, UserId};

/// Authenticated identity resolved from the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Auth service user ID.
    pub user_id: UserId,
    /// Verified email address.
    pub email: Email,
    /// Role claim.
    pub role: Role,
}

impl Identity {
    /// Whether this identity may use the admin dashboard.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
