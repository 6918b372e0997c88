//! Identifiers assigned by the remote trading service.
//!
//! Targets are numbered by the service; orders carry opaque string ids
//! (the same value used as the transaction id on order-level calls).

use serde::{Deserialize, Serialize};

/// Identifier of a market target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(i64);

impl TargetId {
    /// Create a target id from its raw numeric value.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Decode a target id carried in a numeric event field.
    ///
    /// The wire exposes target ids as doubles; the integral part is the id.
    #[must_use]
    pub fn from_field(value: f64) -> Self {
        Self(value as i64)
    }

    /// Encode for a numeric request field.
    #[must_use]
    pub fn as_field(&self) -> f64 {
        self.0 as f64
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TargetId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifier of a live order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Create an order id from the service-assigned string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_id_field_round_trip() {
        let id = TargetId::new(42);
        assert_eq!(TargetId::from_field(id.as_field()), id);
    }

    #[test]
    fn test_target_id_from_field_truncates() {
        // Wire doubles can pick up noise; the integral part is the id.
        assert_eq!(TargetId::from_field(17.0), TargetId::new(17));
    }

    #[test]
    fn test_order_id_display() {
        let id = OrderId::new("ord-123");
        assert_eq!(id.to_string(), "ord-123");
        assert_eq!(id.as_str(), "ord-123");
    }
}
