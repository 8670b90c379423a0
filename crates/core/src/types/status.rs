//! Status enums for orders.

use serde::{Deserialize, Serialize};

/// Payment state of an order.
///
/// Orders are persisted with a boolean `made_payment` column; this enum is
/// the typed view over it. An order only ever moves from `Pending` to `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl PaymentStatus {
    /// Map the stored `made_payment` flag.
    #[must_use]
    pub const fn from_made_payment(made_payment: bool) -> Self {
        if made_payment { Self::Paid } else { Self::Pending }
    }

    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_made_payment() {
        assert_eq!(PaymentStatus::from_made_payment(false), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_made_payment(true), PaymentStatus::Paid);
        assert!(PaymentStatus::Paid.is_paid());
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }
}
