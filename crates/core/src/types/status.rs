//! Status enums for checkout results.

use serde::{Deserialize, Serialize};

/// Result reported by the payment provider when it sends the shopper back
/// to the completion route (`/order/success?status=...`).
///
/// Only the literal `success` counts as a successful payment; any other value,
/// including a missing parameter, is treated as failed or canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Success,
    #[default]
    Failed,
}

impl PaymentStatus {
    /// Interpret the `status` query parameter of the completion route.
    #[must_use]
    pub fn from_query(status: Option<&str>) -> Self {
        match status {
            Some("success") => Self::Success,
            _ => Self::Failed,
        }
    }

    /// Whether the payment went through.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query() {
        assert_eq!(PaymentStatus::from_query(Some("success")), PaymentStatus::Success);
        assert_eq!(PaymentStatus::from_query(Some("cancel")), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_query(Some("SUCCESS")), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_query(None), PaymentStatus::Failed);
    }

    #[test]
    fn test_display() {
        assert_eq!(PaymentStatus::Success.to_string(), "success");
        assert!(!PaymentStatus::Failed.is_success());
    }
}
