//! Trading enums carried as numeric fields.
//!
//! The wire encodes these as doubles inside the numeric field mapping;
//! each enum provides `as_field`/`from_field` for that encoding.

use serde::{Deserialize, Serialize};

/// Order or target side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Numeric wire encoding.
    #[must_use]
    pub fn as_field(&self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => 2.0,
        }
    }

    /// Decode from a numeric field, if recognized.
    #[must_use]
    pub fn from_field(value: f64) -> Option<Self> {
        match value as i64 {
            1 => Some(Self::Buy),
            2 => Some(Self::Sell),
            _ => None,
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrdType {
    Market,
    Limit,
}

impl OrdType {
    /// Numeric wire encoding.
    #[must_use]
    pub fn as_field(&self) -> f64 {
        match self {
            Self::Market => 1.0,
            Self::Limit => 2.0,
        }
    }

    /// Decode from a numeric field, if recognized.
    #[must_use]
    pub fn from_field(value: f64) -> Option<Self> {
        match value as i64 {
            1 => Some(Self::Market),
            2 => Some(Self::Limit),
            _ => None,
        }
    }
}

/// Interpretation of a target's wave size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveSizeType {
    /// Wave size is an absolute share count.
    Shares,
    /// Wave size is a percentage of target quantity.
    PctTgtQty,
}

impl WaveSizeType {
    /// Numeric wire encoding.
    #[must_use]
    pub fn as_field(&self) -> f64 {
        match self {
            Self::Shares => 0.0,
            Self::PctTgtQty => 1.0,
        }
    }

    /// Decode from a numeric field, if recognized.
    #[must_use]
    pub fn from_field(value: f64) -> Option<Self> {
        match value as i64 {
            0 => Some(Self::Shares),
            1 => Some(Self::PctTgtQty),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_round_trip() {
        for side in [Side::Buy, Side::Sell] {
            assert_eq!(Side::from_field(side.as_field()), Some(side));
        }
        assert_eq!(Side::from_field(9.0), None);
    }

    #[test]
    fn test_ord_type_round_trip() {
        for ot in [OrdType::Market, OrdType::Limit] {
            assert_eq!(OrdType::from_field(ot.as_field()), Some(ot));
        }
        assert_eq!(OrdType::from_field(0.0), None);
    }

    #[test]
    fn test_wave_size_type_round_trip() {
        for wst in [WaveSizeType::Shares, WaveSizeType::PctTgtQty] {
            assert_eq!(WaveSizeType::from_field(wst.as_field()), Some(wst));
        }
        assert_eq!(WaveSizeType::from_field(7.0), None);
    }
}
