//! Demonstration client for the remote trading-management API.
//!
//! Orchestrates the full flow: login, portfolio and target setup,
//! subscriptions, first wave, price escalation on open orders, and
//! completion via the shared latch.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::Application;
pub use config::{AppConfig, TargetSpec};
pub use error::{AppError, AppResult};
