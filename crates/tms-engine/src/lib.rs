//! Concurrency and state-machine core of the TMS client.
//!
//! Turns the remote service's raw event streams into time-aware order
//! execution behavior:
//! - [`ActionScheduler`]: cooperative delayed-action timer loop with
//!   cancellable handles
//! - [`StreamConsumer`]: one consuming task per subscription, dispatching
//!   events in arrival order
//! - [`CompletionLatch`]: countdown barrier the initiating task blocks on
//! - [`TradingBook`]: shared id-keyed registries for targets, orders, and
//!   cached market data
//! - [`Target`] / [`Order`]: the coupled state machines driving
//!   wave release and limit → mid → market price escalation
//! - [`TradingFlow`]: routes subscription events into the registries and
//!   entity callbacks
//!
//! Entity mutation happens only from consumer callbacks and scheduler-fired
//! actions; each mutation is a short check-and-update section behind the
//! entity's own lock.

pub mod book;
pub mod consumer;
pub mod error;
pub mod flow;
pub mod latch;
pub mod order;
pub mod rpc;
pub mod scheduler;
pub mod target;

pub use book::TradingBook;
pub use consumer::StreamConsumer;
pub use error::{EngineError, Result};
pub use flow::TradingFlow;
pub use latch::CompletionLatch;
pub use order::{EscalationConfig, Order};
pub use scheduler::{ActionScheduler, ScheduledHandle};
pub use target::{Target, STOP_TEXT};
