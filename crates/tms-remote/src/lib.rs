//! Remote TMS service boundary.
//!
//! The remote trading-management service is an external collaborator; this
//! crate defines the client-side view of it:
//! - [`TradingService`]: unary calls plus bidirectional streaming
//!   subscriptions, behind an object-safe async trait
//! - [`RequestChannel`]: the closable producer-side queue feeding a
//!   subscription's outbound half
//! - typed event unions for the target, order, and market data feeds
//! - [`RemoteError`] with the structured failure metadata the service
//!   attaches to rejected calls
//!
//! Transport (gRPC channel, TLS, reconnection) is out of scope here; any
//! implementation of [`TradingService`] plugs in.

pub mod channel;
pub mod error;
pub mod events;
pub mod requests;
pub mod service;
pub mod testing;

pub use channel::{RequestChannel, RequestStream};
pub use error::{
    error_codes, log_remote_failure, ErrorDetails, RemoteError, RemoteResult,
    MAX_CHILD_EXCEPTION_DETAILS,
};
pub use events::{FeedStatus, MarketDataEvent, OrderEvent, TargetEvent};
pub use requests::{
    AddTargetsRequest, CancelOrdersRequest, CreateMarketPortfolioRequest, LoginRequest,
    ModifyOrdersRequest, ModifyPortfolioRequest, ModifyTargetsRequest, PauseMarketTargetsRequest,
    PortfolioKind, PostAlertMessageRequest, RemovePortfolioRequest, ResumeMarketTargetsRequest,
    SendOrdersRequest, SubscribeForMarketDataRequest, SubscribeForOrdersRequest,
    SubscribeForTargetsRequest, TargetIds, TerminateMarketTargetsRequest,
};
pub use service::{DynTradingService, EventStream, TradingService};
