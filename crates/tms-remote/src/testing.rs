//! In-memory recording service for tests.
//!
//! Records every unary call for verification and lets a test script the
//! three event streams by hand. Lives in non-test code so downstream crates
//! can drive their own tests against it.

use crate::channel::RequestStream;
use crate::error::{RemoteError, RemoteResult};
use crate::events::{MarketDataEvent, OrderEvent, TargetEvent};
use crate::requests::{
    AddTargetsRequest, CancelOrdersRequest, CreateMarketPortfolioRequest, LoginRequest,
    ModifyOrdersRequest, ModifyPortfolioRequest, ModifyTargetsRequest, PauseMarketTargetsRequest,
    PostAlertMessageRequest, RemovePortfolioRequest, ResumeMarketTargetsRequest,
    SendOrdersRequest, SubscribeForMarketDataRequest, SubscribeForOrdersRequest,
    SubscribeForTargetsRequest, TargetIds, TerminateMarketTargetsRequest,
};
use crate::service::{EventStream, TradingService};
use async_trait::async_trait;
use futures_util::stream;
use parking_lot::Mutex;
use tms_core::TargetId;
use tokio::sync::mpsc;

/// Wrap an unbounded receiver of results as a boxed event stream.
fn into_event_stream<E: Send + 'static>(
    rx: mpsc::UnboundedReceiver<RemoteResult<E>>,
) -> EventStream<E> {
    Box::pin(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    }))
}

/// One recorded unary call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Login(LoginRequest),
    CreateMarketPortfolio(CreateMarketPortfolioRequest),
    ModifyMarketPortfolio(ModifyPortfolioRequest),
    RemoveMarketPortfolio(RemovePortfolioRequest),
    AddMarketTargets(AddTargetsRequest),
    ModifyMarketTargets(ModifyTargetsRequest),
    PauseMarketTargets(PauseMarketTargetsRequest),
    ResumeMarketTargets(ResumeMarketTargetsRequest),
    TerminateMarketTargets(TerminateMarketTargetsRequest),
    RemoveMarketTargets(TargetIds),
    SendOrders(SendOrdersRequest),
    ModifyOrders(ModifyOrdersRequest),
    CancelOrders(CancelOrdersRequest),
    PostAlertMessage(PostAlertMessageRequest),
    SubscribeMarketTargets(SubscribeForTargetsRequest),
    SubscribeOrders(SubscribeForOrdersRequest),
    SubscribeMarketData(SubscribeForMarketDataRequest),
}

type EventSender<E> = mpsc::UnboundedSender<RemoteResult<E>>;

/// Recording implementation of [`TradingService`] for tests.
pub struct RecordingService {
    calls: Mutex<Vec<RecordedCall>>,
    next_error: Mutex<Option<RemoteError>>,
    assigned_target_ids: Mutex<Vec<TargetId>>,
    targets_tx: Mutex<Option<EventSender<TargetEvent>>>,
    orders_tx: Mutex<Option<EventSender<OrderEvent>>>,
    market_data_tx: Mutex<Option<EventSender<MarketDataEvent>>>,
}

impl Default for RecordingService {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingService {
    /// Create a recording service with no scripted behavior.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_error: Mutex::new(None),
            assigned_target_ids: Mutex::new(Vec::new()),
            targets_tx: Mutex::new(None),
            orders_tx: Mutex::new(None),
            market_data_tx: Mutex::new(None),
        }
    }

    /// Fail the next unary call with the given error.
    pub fn set_next_error(&self, err: RemoteError) {
        *self.next_error.lock() = Some(err);
    }

    /// Target ids returned by the next `add_market_targets` call.
    pub fn set_assigned_target_ids(&self, ids: Vec<TargetId>) {
        *self.assigned_target_ids.lock() = ids;
    }

    /// Snapshot of recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Order ids across all recorded cancel calls.
    #[must_use]
    pub fn canceled_order_ids(&self) -> Vec<tms_core::OrderId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::CancelOrders(req) => Some(req.order_ids.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Modify-order requests recorded so far.
    #[must_use]
    pub fn order_modifications(&self) -> Vec<ModifyOrdersRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::ModifyOrders(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    /// Target ids across all recorded send-orders calls.
    #[must_use]
    pub fn wave_requests(&self) -> Vec<TargetId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::SendOrders(req) => Some(req.target_ids.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Alerts recorded so far.
    #[must_use]
    pub fn alerts(&self) -> Vec<PostAlertMessageRequest> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::PostAlertMessage(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    /// Push an event onto the targets stream.
    pub fn push_target_event(&self, event: TargetEvent) {
        if let Some(tx) = self.targets_tx.lock().as_ref() {
            let _ = tx.send(Ok(event));
        }
    }

    /// Push an event onto the orders stream.
    pub fn push_order_event(&self, event: OrderEvent) {
        if let Some(tx) = self.orders_tx.lock().as_ref() {
            let _ = tx.send(Ok(event));
        }
    }

    /// Push an event onto the market-data stream.
    pub fn push_market_data_event(&self, event: MarketDataEvent) {
        if let Some(tx) = self.market_data_tx.lock().as_ref() {
            let _ = tx.send(Ok(event));
        }
    }

    /// Fail the targets stream; it ends after delivering the error.
    pub fn fail_target_stream(&self, err: RemoteError) {
        if let Some(tx) = self.targets_tx.lock().take() {
            let _ = tx.send(Err(err));
        }
    }

    /// End the targets stream gracefully.
    pub fn close_target_stream(&self) {
        self.targets_tx.lock().take();
    }

    /// End the orders stream gracefully.
    pub fn close_order_stream(&self) {
        self.orders_tx.lock().take();
    }

    /// End the market-data stream gracefully.
    pub fn close_market_data_stream(&self) {
        self.market_data_tx.lock().take();
    }

    fn record(&self, call: RecordedCall) -> RemoteResult<()> {
        self.calls.lock().push(call);
        match self.next_error.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TradingService for RecordingService {
    async fn login(&self, request: LoginRequest) -> RemoteResult<()> {
        self.record(RecordedCall::Login(request))
    }

    async fn create_market_portfolio(
        &self,
        request: CreateMarketPortfolioRequest,
    ) -> RemoteResult<()> {
        self.record(RecordedCall::CreateMarketPortfolio(request))
    }

    async fn modify_market_portfolio(&self, request: ModifyPortfolioRequest) -> RemoteResult<()> {
        self.record(RecordedCall::ModifyMarketPortfolio(request))
    }

    async fn remove_market_portfolio(&self, request: RemovePortfolioRequest) -> RemoteResult<()> {
        self.record(RecordedCall::RemoveMarketPortfolio(request))
    }

    async fn add_market_targets(&self, request: AddTargetsRequest) -> RemoteResult<Vec<TargetId>> {
        let count = request.fields.len();
        self.record(RecordedCall::AddMarketTargets(request))?;
        let scripted = std::mem::take(&mut *self.assigned_target_ids.lock());
        if scripted.is_empty() {
            Ok((1..=count as i64).map(TargetId::new).collect())
        } else {
            Ok(scripted)
        }
    }

    async fn modify_market_targets(&self, request: ModifyTargetsRequest) -> RemoteResult<()> {
        self.record(RecordedCall::ModifyMarketTargets(request))
    }

    async fn pause_market_targets(&self, request: PauseMarketTargetsRequest) -> RemoteResult<()> {
        self.record(RecordedCall::PauseMarketTargets(request))
    }

    async fn resume_market_targets(
        &self,
        request: ResumeMarketTargetsRequest,
    ) -> RemoteResult<()> {
        self.record(RecordedCall::ResumeMarketTargets(request))
    }

    async fn terminate_market_targets(
        &self,
        request: TerminateMarketTargetsRequest,
    ) -> RemoteResult<()> {
        self.record(RecordedCall::TerminateMarketTargets(request))
    }

    async fn remove_market_targets(&self, request: TargetIds) -> RemoteResult<()> {
        self.record(RecordedCall::RemoveMarketTargets(request))
    }

    async fn send_orders(&self, request: SendOrdersRequest) -> RemoteResult<()> {
        self.record(RecordedCall::SendOrders(request))
    }

    async fn modify_orders(&self, request: ModifyOrdersRequest) -> RemoteResult<()> {
        self.record(RecordedCall::ModifyOrders(request))
    }

    async fn cancel_orders(&self, request: CancelOrdersRequest) -> RemoteResult<()> {
        self.record(RecordedCall::CancelOrders(request))
    }

    async fn post_alert_message(&self, request: PostAlertMessageRequest) -> RemoteResult<()> {
        self.record(RecordedCall::PostAlertMessage(request))
    }

    async fn subscribe_market_targets(
        &self,
        mut requests: RequestStream<SubscribeForTargetsRequest>,
    ) -> RemoteResult<EventStream<TargetEvent>> {
        if let Some(req) = requests.recv().await {
            self.calls
                .lock()
                .push(RecordedCall::SubscribeMarketTargets(req));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.targets_tx.lock() = Some(tx);
        Ok(into_event_stream(rx))
    }

    async fn subscribe_orders(
        &self,
        mut requests: RequestStream<SubscribeForOrdersRequest>,
    ) -> RemoteResult<EventStream<OrderEvent>> {
        if let Some(req) = requests.recv().await {
            self.calls.lock().push(RecordedCall::SubscribeOrders(req));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.orders_tx.lock() = Some(tx);
        Ok(into_event_stream(rx))
    }

    async fn subscribe_market_data(
        &self,
        mut requests: RequestStream<SubscribeForMarketDataRequest>,
    ) -> RemoteResult<EventStream<MarketDataEvent>> {
        if let Some(req) = requests.recv().await {
            self.calls
                .lock()
                .push(RecordedCall::SubscribeMarketData(req));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.market_data_tx.lock() = Some(tx);
        Ok(into_event_stream(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::RequestChannel;
    use crate::events::FeedStatus;

    #[tokio::test]
    async fn test_records_unary_calls() {
        let service = RecordingService::new();
        service
            .login(LoginRequest {
                user: "demo".to_string(),
                password: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_next_error_consumed_once() {
        let service = RecordingService::new();
        service.set_next_error(RemoteError::rejected("Boom", "scripted"));

        let first = service
            .create_market_portfolio(CreateMarketPortfolioRequest::pure("p"))
            .await;
        assert!(first.is_err());

        let second = service
            .create_market_portfolio(CreateMarketPortfolioRequest::pure("p"))
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_add_targets_assigns_sequential_ids_by_default() {
        let service = RecordingService::new();
        let ids = service
            .add_market_targets(AddTargetsRequest {
                portfolio: "p".to_string(),
                fields: vec![Default::default(), Default::default()],
            })
            .await
            .unwrap();
        assert_eq!(ids, vec![TargetId::new(1), TargetId::new(2)]);
    }

    #[tokio::test]
    async fn test_scripted_event_stream() {
        use futures_util::StreamExt;

        let service = RecordingService::new();
        let (_channel, stream) = RequestChannel::with_initial(SubscribeForTargetsRequest {
            filter: String::new(),
            fields: Vec::new(),
        });
        let mut events = service.subscribe_market_targets(stream).await.unwrap();

        service.push_target_event(TargetEvent::Feed(FeedStatus::InitialStateReceived));
        service.close_target_stream();

        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first, TargetEvent::Feed(FeedStatus::InitialStateReceived));
        assert!(events.next().await.is_none());
    }
}
