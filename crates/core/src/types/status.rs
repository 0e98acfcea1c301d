//! Status enums for orders and signed-in users.

use serde::{Deserialize, Serialize};

/// Order lifecycle status, as stored in the `orders.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The wire value stored in the data service.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label shown in the shop and dashboard.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "En attente",
            Self::Processing => "En cours",
            Self::Shipped => "Expédié",
            Self::Delivered => "Livré",
            Self::Cancelled => "Annulé",
        }
    }

    /// CSS classes for the status badge.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "badge badge-yellow",
            Self::Processing => "badge badge-blue",
            Self::Shipped => "badge badge-purple",
            Self::Delivered => "badge badge-green",
            Self::Cancelled => "badge badge-red",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Role of a signed-in user.
///
/// Comes from the auth service's `app_metadata.role` claim. Anything other
/// than `admin` is a regular customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Can open the dashboard and manage products and orders.
    Admin,
    /// Shop visitor with an account.
    #[default]
    Customer,
}

impl Role {
    /// Map the raw role claim to a role.
    #[must_use]
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("admin") => Self::Admin,
            _ => Self::Customer,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_status_from_str_matches_as_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(OrderStatus::Pending.label(), "En attente");
        assert_eq!(OrderStatus::Shipped.label(), "Expédié");
    }

    #[test]
    fn test_role_from_claim() {
        assert_eq!(Role::from_claim(Some("admin")), Role::Admin);
        assert_eq!(Role::from_claim(Some("Admin")), Role::Customer);
        assert_eq!(Role::from_claim(Some("customer")), Role::Customer);
        assert_eq!(Role::from_claim(None), Role::Customer);
    }
}
