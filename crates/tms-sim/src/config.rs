//! Simulator configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Behavior knobs for the simulated service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Last traded price per instrument; also seeds new order limit prices.
    #[serde(default)]
    pub instrument_prices: HashMap<String, f64>,

    /// Distance between last price and published mid price.
    #[serde(default = "default_mid_px_offset")]
    pub mid_px_offset: f64,

    /// Fill each released order in full after this delay. `None` leaves
    /// fills to an external driver (tests call `fill_order`).
    #[serde(default)]
    pub auto_fill_delay_ms: Option<u64>,

    /// Publish the price table on this interval. `None` disables the
    /// periodic feed.
    #[serde(default)]
    pub market_data_interval_ms: Option<u64>,

    /// Wave size (percent of target quantity) used until a target is
    /// modified with its own wave instructions.
    #[serde(default = "default_wave_size_pct")]
    pub default_wave_size_pct: f64,
}

fn default_mid_px_offset() -> f64 {
    0.1
}

fn default_wave_size_pct() -> f64 {
    10.0
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            instrument_prices: HashMap::new(),
            mid_px_offset: default_mid_px_offset(),
            auto_fill_delay_ms: None,
            market_data_interval_ms: None,
            default_wave_size_pct: default_wave_size_pct(),
        }
    }
}

impl SimConfig {
    /// Config with a price table and everything else at defaults.
    #[must_use]
    pub fn with_prices(prices: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            instrument_prices: prices.into_iter().collect(),
            ..Self::default()
        }
    }
}
