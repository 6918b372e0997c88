//! Field maps carried by events and request messages.
//!
//! The remote service exposes every record as two named mappings: one
//! string-valued, one numeric-valued, keyed by field name. Subscriptions
//! select which fields are populated, so every read is optional.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known field names.
pub mod names {
    /// Target identifier (numeric).
    pub const TGT_ID: &str = "TgtID";
    /// Total target quantity.
    pub const TGT_QTY: &str = "TgtQty";
    /// Quantity not yet released to the market.
    pub const UNRELEASED: &str = "Unreleased";
    /// Free-text field; carries the stop sentinel.
    pub const TEXT: &str = "Text";
    /// Instrument symbol.
    pub const INSTRUMENT: &str = "Instrument";
    /// Unfilled quantity left on a live order.
    pub const LEAVES: &str = "Leaves";
    /// Order quantity.
    pub const ORD_QTY: &str = "OrdQty";
    /// Order limit price.
    pub const ORD_PX: &str = "OrdPx";
    /// Order type (see [`crate::OrdType`]).
    pub const ORD_TYPE: &str = "OrdType";
    /// Price on a modification message.
    pub const PRICE: &str = "Price";
    /// Side (see [`crate::Side`]).
    pub const SIDE: &str = "Side";
    /// Last traded price.
    pub const LAST_PX: &str = "LastPx";
    /// Midpoint of best bid/ask.
    pub const MID_PX: &str = "MidPx";
    /// Wave size value.
    pub const WAVE_SIZE: &str = "WaveSize";
    /// Wave size interpretation (see [`crate::WaveSizeType`]).
    pub const WAVE_SIZE_TYPE: &str = "WaveSizeType";
    /// Transaction destination alias.
    pub const TRN_DESTINATION: &str = "TrnDestination";
    /// Client name annotation.
    pub const CLIENT_NAME: &str = "ClientName";
    /// Price instruction, e.g. "BidPx:AskPx".
    pub const SET_PX_TO: &str = "SetPxTo";
}

/// A record's fields: string-valued and numeric-valued mappings.
///
/// Numeric wire fields are IEEE doubles end to end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMap {
    /// String-valued fields keyed by field name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub string_fields: HashMap<String, String>,
    /// Numeric-valued fields keyed by field name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub numeric_fields: HashMap<String, f64>,
}

impl FieldMap {
    /// Create an empty field map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a string field.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        self.string_fields.get(name).map(String::as_str)
    }

    /// Look up a numeric field.
    #[must_use]
    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.numeric_fields.get(name).copied()
    }

    /// Check whether a field is present in either mapping.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.string_fields.contains_key(name) || self.numeric_fields.contains_key(name)
    }

    /// Check whether both mappings are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.string_fields.is_empty() && self.numeric_fields.is_empty()
    }

    /// Builder-style insert of a string field.
    #[must_use]
    pub fn with_string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.string_fields.insert(name.into(), value.into());
        self
    }

    /// Builder-style insert of a numeric field.
    #[must_use]
    pub fn with_numeric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.numeric_fields.insert(name.into(), value);
        self
    }

    /// Insert a string field.
    pub fn set_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.string_fields.insert(name.into(), value.into());
    }

    /// Insert a numeric field.
    pub fn set_numeric(&mut self, name: impl Into<String>, value: f64) {
        self.numeric_fields.insert(name.into(), value);
    }

    /// Overlay another field map onto this one.
    ///
    /// Fields present in `other` replace fields of the same name here;
    /// fields absent from `other` are left untouched.
    pub fn merge(&mut self, other: &FieldMap) {
        for (k, v) in &other.string_fields {
            self.string_fields.insert(k.clone(), v.clone());
        }
        for (k, v) in &other.numeric_fields {
            self.numeric_fields.insert(k.clone(), *v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lookups() {
        let fields = FieldMap::new();
        assert!(fields.is_empty());
        assert_eq!(fields.string(names::TEXT), None);
        assert_eq!(fields.numeric(names::LEAVES), None);
        assert!(!fields.contains(names::LEAVES));
    }

    #[test]
    fn test_builder_and_lookup() {
        let fields = FieldMap::new()
            .with_string(names::INSTRUMENT, "IBM")
            .with_numeric(names::LEAVES, 100.0);
        assert_eq!(fields.string(names::INSTRUMENT), Some("IBM"));
        assert_eq!(fields.numeric(names::LEAVES), Some(100.0));
        assert!(fields.contains(names::INSTRUMENT));
    }

    #[test]
    fn test_merge_overlays_and_preserves() {
        let mut base = FieldMap::new()
            .with_string(names::INSTRUMENT, "IBM")
            .with_numeric(names::LEAVES, 100.0)
            .with_numeric(names::ORD_PX, 50.0);
        let patch = FieldMap::new().with_numeric(names::ORD_PX, 49.8);

        base.merge(&patch);

        assert_eq!(base.numeric(names::ORD_PX), Some(49.8));
        assert_eq!(base.numeric(names::LEAVES), Some(100.0));
        assert_eq!(base.string(names::INSTRUMENT), Some("IBM"));
    }

    #[test]
    fn test_serde_round_trip() {
        let fields = FieldMap::new()
            .with_string(names::TEXT, "STOP")
            .with_numeric(names::UNRELEASED, 0.0);
        let json = serde_json::to_string(&fields).unwrap();
        let back: FieldMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fields);
    }

    #[test]
    fn test_serde_field_names_match_wire() {
        let fields = FieldMap::new().with_string(names::TEXT, "STOP");
        let json = serde_json::to_string(&fields).unwrap();
        assert!(json.contains("stringFields"));
    }
}
