//! In-process simulated TMS service.
//!
//! Implements [`tms_remote::TradingService`] entirely in memory: portfolios,
//! wave-based target release, order fills and cancels, and event fan-out to
//! subscribers. Stands in for the out-of-scope remote transport so the demo
//! binary and integration tests can run the whole client end to end.

pub mod config;
pub mod service;

pub use config::SimConfig;
pub use service::SimulatedTms;
