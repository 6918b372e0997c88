//! The remote trading service trait.
//!
//! Unary request/response calls plus three bidirectional streaming
//! subscriptions. Each subscription takes the consuming half of a
//! [`RequestChannel`](crate::RequestChannel) and yields typed events until
//! the client closes its request side or the stream fails.

use crate::channel::RequestStream;
use crate::error::RemoteResult;
use crate::events::{MarketDataEvent, OrderEvent, TargetEvent};
use crate::requests::{
    AddTargetsRequest, CancelOrdersRequest, CreateMarketPortfolioRequest, LoginRequest,
    ModifyOrdersRequest, ModifyPortfolioRequest, ModifyTargetsRequest, PauseMarketTargetsRequest,
    PostAlertMessageRequest, RemovePortfolioRequest, ResumeMarketTargetsRequest,
    SendOrdersRequest, SubscribeForMarketDataRequest, SubscribeForOrdersRequest,
    SubscribeForTargetsRequest, TargetIds, TerminateMarketTargetsRequest,
};
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tms_core::TargetId;

/// Boxed stream of subscription events.
///
/// `Err` items indicate stream failure; the stream ends after the first
/// error or on graceful completion.
pub type EventStream<E> = Pin<Box<dyn Stream<Item = RemoteResult<E>> + Send>>;

/// Client-side view of the remote trading-management service.
///
/// Implementations are transport-specific (gRPC in production, in-process
/// for tests and the demo simulator); callers hold `Arc<dyn TradingService>`
/// and treat every call as a fire-level RPC with no local rollback.
#[async_trait]
pub trait TradingService: Send + Sync {
    async fn login(&self, request: LoginRequest) -> RemoteResult<()>;

    async fn create_market_portfolio(
        &self,
        request: CreateMarketPortfolioRequest,
    ) -> RemoteResult<()>;

    async fn modify_market_portfolio(&self, request: ModifyPortfolioRequest) -> RemoteResult<()>;

    async fn remove_market_portfolio(&self, request: RemovePortfolioRequest) -> RemoteResult<()>;

    /// Returns the ids assigned to the created targets, in request order.
    async fn add_market_targets(&self, request: AddTargetsRequest) -> RemoteResult<Vec<TargetId>>;

    async fn modify_market_targets(&self, request: ModifyTargetsRequest) -> RemoteResult<()>;

    async fn pause_market_targets(&self, request: PauseMarketTargetsRequest) -> RemoteResult<()>;

    async fn resume_market_targets(&self, request: ResumeMarketTargetsRequest)
        -> RemoteResult<()>;

    async fn terminate_market_targets(
        &self,
        request: TerminateMarketTargetsRequest,
    ) -> RemoteResult<()>;

    async fn remove_market_targets(&self, request: TargetIds) -> RemoteResult<()>;

    async fn send_orders(&self, request: SendOrdersRequest) -> RemoteResult<()>;

    async fn modify_orders(&self, request: ModifyOrdersRequest) -> RemoteResult<()>;

    async fn cancel_orders(&self, request: CancelOrdersRequest) -> RemoteResult<()>;

    async fn post_alert_message(&self, request: PostAlertMessageRequest) -> RemoteResult<()>;

    async fn subscribe_market_targets(
        &self,
        requests: RequestStream<SubscribeForTargetsRequest>,
    ) -> RemoteResult<EventStream<TargetEvent>>;

    async fn subscribe_orders(
        &self,
        requests: RequestStream<SubscribeForOrdersRequest>,
    ) -> RemoteResult<EventStream<OrderEvent>>;

    async fn subscribe_market_data(
        &self,
        requests: RequestStream<SubscribeForMarketDataRequest>,
    ) -> RemoteResult<EventStream<MarketDataEvent>>;
}

/// Shared trait-object handle to a trading service.
pub type DynTradingService = Arc<dyn TradingService>;
