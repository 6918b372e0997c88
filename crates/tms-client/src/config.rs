//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tms_core::{fields::names, FieldMap, Side};
use tms_engine::EscalationConfig;
use tms_sim::SimConfig;

/// One target to trade, as configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Instrument symbol.
    pub instrument: String,
    /// Buy or sell.
    pub side: Side,
    /// Total quantity to release.
    pub quantity: f64,
    /// Optional client annotation.
    #[serde(default)]
    pub client_name: Option<String>,
    /// Optional price instruction, e.g. "BidPx:AskPx".
    #[serde(default)]
    pub set_px_to: Option<String>,
}

impl TargetSpec {
    /// Render as the field map sent on target creation.
    #[must_use]
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new()
            .with_string(names::INSTRUMENT, self.instrument.clone())
            .with_numeric(names::SIDE, self.side.as_field())
            .with_numeric(names::TGT_QTY, self.quantity);
        if let Some(client_name) = &self.client_name {
            fields.set_string(names::CLIENT_NAME, client_name.clone());
        }
        if let Some(set_px_to) = &self.set_px_to {
            fields.set_string(names::SET_PX_TO, set_px_to.clone());
        }
        fields
    }
}

/// Price-escalation settings, in config units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationSettings {
    /// Dwell time before walking the price to mid (ms). Default: 2000.
    #[serde(default = "default_mid_px_timeout_ms")]
    pub mid_px_timeout_ms: u64,
    /// Dwell time at mid before going to market (ms). Default: 3000.
    #[serde(default = "default_market_timeout_ms")]
    pub market_timeout_ms: u64,
    /// Relative last-price deviation that forces the mid step. Default: 0.01.
    #[serde(default = "default_max_px_deviation")]
    pub max_px_deviation: f64,
}

fn default_mid_px_timeout_ms() -> u64 {
    2000
}

fn default_market_timeout_ms() -> u64 {
    3000
}

fn default_max_px_deviation() -> f64 {
    0.01
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            mid_px_timeout_ms: default_mid_px_timeout_ms(),
            market_timeout_ms: default_market_timeout_ms(),
            max_px_deviation: default_max_px_deviation(),
        }
    }
}

impl EscalationSettings {
    /// Convert to the engine's escalation configuration.
    #[must_use]
    pub fn to_engine_config(&self) -> EscalationConfig {
        EscalationConfig {
            mid_px_timeout: std::time::Duration::from_millis(self.mid_px_timeout_ms),
            market_timeout: std::time::Duration::from_millis(self.market_timeout_ms),
            max_px_deviation: self.max_px_deviation,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Login user. Default: "demo".
    #[serde(default = "default_user")]
    pub user: String,
    /// Login password. Default: empty.
    #[serde(default)]
    pub password: String,
    /// Portfolio name prefix; a timestamp is appended per run.
    #[serde(default = "default_portfolio_prefix")]
    pub portfolio_prefix: String,
    /// Transaction destination set on all targets.
    #[serde(default = "default_destination")]
    pub destination: String,
    /// Wave size as percent of target quantity.
    #[serde(default = "default_wave_size_pct")]
    pub wave_size_pct: f64,
    /// Price-escalation settings.
    #[serde(default)]
    pub escalation: EscalationSettings,
    /// Targets to create and trade.
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
    /// In-process simulator settings.
    #[serde(default)]
    pub simulator: SimConfig,
}

fn default_user() -> String {
    "demo".to_string()
}

fn default_portfolio_prefix() -> String {
    "tmsSample".to_string()
}

fn default_destination() -> String {
    "Simulator1".to_string()
}

fn default_wave_size_pct() -> f64 {
    10.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            password: String::new(),
            portfolio_prefix: default_portfolio_prefix(),
            destination: default_destination(),
            wave_size_pct: default_wave_size_pct(),
            escalation: EscalationSettings::default(),
            targets: Vec::new(),
            simulator: SimConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(config_path: &str) -> AppResult<Self> {
        if Path::new(config_path).exists() {
            Self::from_file(config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Distinct instruments across all configured targets.
    #[must_use]
    pub fn instruments(&self) -> Vec<String> {
        let mut instruments: Vec<String> = self
            .targets
            .iter()
            .map(|t| t.instrument.clone())
            .collect();
        instruments.sort();
        instruments.dedup();
        instruments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.user, "demo");
        assert_eq!(config.wave_size_pct, 10.0);
        assert_eq!(config.escalation.mid_px_timeout_ms, 2000);
        assert_eq!(config.escalation.market_timeout_ms, 3000);
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_src = r#"
            user = "demo"
            portfolio_prefix = "sample"
            wave_size_pct = 25.0

            [escalation]
            mid_px_timeout_ms = 1500

            [[targets]]
            instrument = "IBM"
            side = "buy"
            quantity = 1000.0
            set_px_to = "BidPx:AskPx"

            [[targets]]
            instrument = "MSFT"
            side = "sell"
            quantity = 500.0

            [simulator]
            auto_fill_delay_ms = 250

            [simulator.instrument_prices]
            IBM = 50.0
            MSFT = 99.0
        "#;
        let config: AppConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.wave_size_pct, 25.0);
        assert_eq!(config.escalation.mid_px_timeout_ms, 1500);
        // Unset fields keep their defaults.
        assert_eq!(config.escalation.market_timeout_ms, 3000);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[1].side, Side::Sell);
        assert_eq!(config.simulator.auto_fill_delay_ms, Some(250));
        assert_eq!(config.simulator.instrument_prices["IBM"], 50.0);
    }

    #[test]
    fn test_instruments_deduplicated() {
        let mut config = AppConfig::default();
        for instrument in ["IBM", "MSFT", "IBM"] {
            config.targets.push(TargetSpec {
                instrument: instrument.to_string(),
                side: Side::Buy,
                quantity: 100.0,
                client_name: None,
                set_px_to: None,
            });
        }
        assert_eq!(config.instruments(), vec!["IBM", "MSFT"]);
    }

    #[test]
    fn test_target_spec_fields() {
        let spec = TargetSpec {
            instrument: "IBM".to_string(),
            side: Side::Buy,
            quantity: 1000.0,
            client_name: Some("desk-1".to_string()),
            set_px_to: None,
        };
        let fields = spec.to_fields();
        assert_eq!(fields.string(names::INSTRUMENT), Some("IBM"));
        assert_eq!(fields.numeric(names::SIDE), Some(Side::Buy.as_field()));
        assert_eq!(fields.numeric(names::TGT_QTY), Some(1000.0));
        assert_eq!(fields.string(names::CLIENT_NAME), Some("desk-1"));
        assert!(fields.string(names::SET_PX_TO).is_none());
    }
}
