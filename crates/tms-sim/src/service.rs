//! The simulated trading service.
//!
//! State lives in sharded maps; every mutation broadcasts the matching
//! event to current subscribers. Each subscription's event stream ends when
//! the client closes its request channel, mirroring the cooperative
//! shutdown of the real service.

use crate::config::SimConfig;
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tms_core::{fields::names, FieldMap, OrdType, OrderId, TargetId, WaveSizeType};
use tms_remote::{
    error_codes, AddTargetsRequest, CancelOrdersRequest, CreateMarketPortfolioRequest,
    ErrorDetails, EventStream, FeedStatus, LoginRequest, MarketDataEvent, ModifyOrdersRequest,
    ModifyPortfolioRequest, ModifyTargetsRequest, OrderEvent, PauseMarketTargetsRequest,
    PostAlertMessageRequest, RemoteError, RemoteResult, RemovePortfolioRequest, RequestStream,
    ResumeMarketTargetsRequest, SendOrdersRequest, SubscribeForMarketDataRequest,
    SubscribeForOrdersRequest, SubscribeForTargetsRequest, TargetEvent, TargetIds,
    TerminateMarketTargetsRequest, TradingService,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct SimTarget {
    portfolio: String,
    instrument: String,
    tgt_qty: f64,
    unreleased: f64,
    wave_size_type: WaveSizeType,
    wave_size: f64,
    terminated: bool,
}

impl SimTarget {
    fn wave_quantity(&self) -> f64 {
        let wave = match self.wave_size_type {
            WaveSizeType::PctTgtQty => self.tgt_qty * self.wave_size / 100.0,
            WaveSizeType::Shares => self.wave_size,
        };
        wave.min(self.unreleased)
    }
}

struct SimOrder {
    target_id: TargetId,
    instrument: String,
    price: f64,
    ord_type: OrdType,
    qty: f64,
    leaves: f64,
}

type Subscribers<E> = DashMap<u64, mpsc::UnboundedSender<RemoteResult<E>>>;

/// In-memory implementation of the remote trading service.
pub struct SimulatedTms {
    config: SimConfig,
    logged_in: AtomicBool,
    portfolios: DashMap<String, FieldMap>,
    targets: DashMap<TargetId, SimTarget>,
    orders: DashMap<OrderId, SimOrder>,
    alerts: Mutex<Vec<PostAlertMessageRequest>>,
    next_target_id: AtomicI64,
    next_sub_id: AtomicU64,
    target_subs: Subscribers<TargetEvent>,
    order_subs: Subscribers<OrderEvent>,
    market_data_subs: Subscribers<MarketDataEvent>,
    self_ref: Weak<SimulatedTms>,
}

impl SimulatedTms {
    /// Create a simulator; spawns the periodic market-data feed when
    /// configured.
    #[must_use]
    pub fn new(config: SimConfig) -> Arc<Self> {
        let sim = Arc::new_cyclic(|weak: &Weak<SimulatedTms>| Self {
            config,
            logged_in: AtomicBool::new(false),
            portfolios: DashMap::new(),
            targets: DashMap::new(),
            orders: DashMap::new(),
            alerts: Mutex::new(Vec::new()),
            next_target_id: AtomicI64::new(1),
            next_sub_id: AtomicU64::new(1),
            target_subs: DashMap::new(),
            order_subs: DashMap::new(),
            market_data_subs: DashMap::new(),
            self_ref: weak.clone(),
        });
        if let Some(interval_ms) = sim.config.market_data_interval_ms {
            sim.spawn_market_data_feed(interval_ms);
        }
        sim
    }

    // ------------------------------------------------------------------
    // Driver hooks for tests and the demo
    // ------------------------------------------------------------------

    /// Ids of orders that still have unfilled quantity.
    #[must_use]
    pub fn open_order_ids(&self) -> Vec<OrderId> {
        self.orders
            .iter()
            .filter(|entry| entry.value().leaves > 0.0)
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Remaining unreleased quantity of a target, if it exists.
    #[must_use]
    pub fn target_unreleased(&self, target_id: TargetId) -> Option<f64> {
        self.targets.get(&target_id).map(|t| t.unreleased)
    }

    /// Alerts posted so far.
    #[must_use]
    pub fn posted_alerts(&self) -> Vec<PostAlertMessageRequest> {
        self.alerts.lock().clone()
    }

    /// Current working price of an order, if it exists.
    #[must_use]
    pub fn order_price(&self, order_id: &OrderId) -> Option<f64> {
        self.orders.get(order_id).map(|order| order.price)
    }

    /// Current order type of an order, if it exists.
    #[must_use]
    pub fn order_type(&self, order_id: &OrderId) -> Option<OrdType> {
        self.orders.get(order_id).map(|order| order.ord_type)
    }

    /// Fill an order in full; publishes the zero-leaves update.
    pub fn fill_order(&self, order_id: &OrderId) {
        self.fill_order_by(order_id, f64::INFINITY);
    }

    /// Fill part of an order; publishes the updated leaves.
    pub fn fill_order_by(&self, order_id: &OrderId, quantity: f64) {
        let leaves = {
            let Some(mut order) = self.orders.get_mut(order_id) else {
                warn!(order = %order_id, "Fill for unknown order ignored");
                return;
            };
            if order.leaves <= 0.0 {
                debug!(order = %order_id, "Order already closed, fill ignored");
                return;
            }
            order.leaves = (order.leaves - quantity).max(0.0);
            order.leaves
        };
        self.broadcast_order(OrderEvent::Updated {
            order_id: order_id.clone(),
            fields: FieldMap::new().with_numeric(names::LEAVES, leaves),
        });
    }

    /// Publish one market-data tick for an instrument.
    pub fn publish_market_data(&self, instrument: &str, last_px: f64, mid_px: f64) {
        self.broadcast_market_data(MarketDataEvent::Update {
            instrument: instrument.to_string(),
            fields: FieldMap::new()
                .with_numeric(names::LAST_PX, last_px)
                .with_numeric(names::MID_PX, mid_px),
        });
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_login(&self) -> RemoteResult<()> {
        if self.logged_in.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(RemoteError::rejected("NotAuthenticated", "login required"))
        }
    }

    fn spawn_market_data_feed(&self, interval_ms: u64) {
        let weak = self.self_ref.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            loop {
                ticker.tick().await;
                let Some(sim) = weak.upgrade() else { break };
                for entry in sim.config.instrument_prices.clone() {
                    let (instrument, last_px) = entry;
                    let mid_px = last_px - sim.config.mid_px_offset;
                    sim.publish_market_data(&instrument, last_px, mid_px);
                }
            }
        });
    }

    fn spawn_auto_fill(&self, order_id: OrderId, delay_ms: u64) {
        let weak = self.self_ref.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            if let Some(sim) = weak.upgrade() {
                sim.fill_order(&order_id);
            }
        });
    }

    fn broadcast_target(&self, event: TargetEvent) {
        self.target_subs
            .retain(|_, tx| tx.send(Ok(event.clone())).is_ok());
    }

    fn broadcast_order(&self, event: OrderEvent) {
        self.order_subs
            .retain(|_, tx| tx.send(Ok(event.clone())).is_ok());
    }

    fn broadcast_market_data(&self, event: MarketDataEvent) {
        self.market_data_subs
            .retain(|_, tx| tx.send(Ok(event.clone())).is_ok());
    }

    fn target_snapshot_fields(target_id: TargetId, target: &SimTarget) -> FieldMap {
        FieldMap::new()
            .with_numeric(names::TGT_ID, target_id.as_field())
            .with_numeric(names::TGT_QTY, target.tgt_qty)
            .with_numeric(names::UNRELEASED, target.unreleased)
            .with_string(names::INSTRUMENT, target.instrument.clone())
    }

    fn order_snapshot_fields(order: &SimOrder) -> FieldMap {
        FieldMap::new()
            .with_numeric(names::TGT_ID, order.target_id.as_field())
            .with_string(names::INSTRUMENT, order.instrument.clone())
            .with_numeric(names::ORD_QTY, order.qty)
            .with_numeric(names::LEAVES, order.leaves)
            .with_numeric(names::ORD_PX, order.price)
            .with_numeric(names::ORD_TYPE, order.ord_type.as_field())
    }

    /// Release the next wave of one target; emits the target update and the
    /// order added event.
    fn release_wave(&self, target_id: TargetId) {
        let released = {
            let Some(mut target) = self.targets.get_mut(&target_id) else {
                warn!(target = %target_id, "Send orders for unknown target ignored");
                return;
            };
            if target.terminated {
                debug!(target = %target_id, "Target terminated, wave ignored");
                return;
            }
            let wave = target.wave_quantity();
            if wave <= 0.0 {
                debug!(target = %target_id, "Nothing unreleased, wave ignored");
                return;
            }
            target.unreleased -= wave;
            Some((
                target.instrument.clone(),
                wave,
                target.unreleased,
            ))
        };
        let Some((instrument, wave, unreleased)) = released else {
            return;
        };

        self.broadcast_target(TargetEvent::Updated {
            target_id,
            fields: FieldMap::new().with_numeric(names::UNRELEASED, unreleased),
        });

        let order_id = OrderId::new(Uuid::new_v4().to_string());
        let price = self
            .config
            .instrument_prices
            .get(&instrument)
            .copied()
            .unwrap_or(100.0);
        let order = SimOrder {
            target_id,
            instrument,
            price,
            ord_type: OrdType::Limit,
            qty: wave,
            leaves: wave,
        };
        let fields = Self::order_snapshot_fields(&order);
        self.orders.insert(order_id.clone(), order);
        info!(order = %order_id, target = %target_id, wave, "Wave released");
        self.broadcast_order(OrderEvent::Added {
            order_id: order_id.clone(),
            fields,
        });

        if let Some(delay_ms) = self.config.auto_fill_delay_ms {
            self.spawn_auto_fill(order_id, delay_ms);
        }
    }

    /// Apply one modification message to a target and publish the update.
    fn apply_target_modification(&self, target_id: TargetId, message: &FieldMap) -> RemoteResult<()> {
        {
            let Some(mut target) = self.targets.get_mut(&target_id) else {
                return Err(RemoteError::rejected(
                    "TargetNotFound",
                    format!("target {target_id} does not exist"),
                ));
            };
            if let Some(wave_size) = message.numeric(names::WAVE_SIZE) {
                target.wave_size = wave_size;
            }
            if let Some(raw) = message.numeric(names::WAVE_SIZE_TYPE) {
                if let Some(wave_size_type) = WaveSizeType::from_field(raw) {
                    target.wave_size_type = wave_size_type;
                }
            }
        }
        // Echo the applied message so subscribers see Text and friends.
        self.broadcast_target(TargetEvent::Updated {
            target_id,
            fields: message.clone(),
        });
        Ok(())
    }

    fn cancel_target_orders(&self, target_id: TargetId) {
        let open: Vec<OrderId> = self
            .orders
            .iter()
            .filter(|entry| entry.value().target_id == target_id && entry.value().leaves > 0.0)
            .map(|entry| entry.key().clone())
            .collect();
        for order_id in open {
            self.close_order(&order_id);
        }
    }

    fn close_order(&self, order_id: &OrderId) {
        let closed = {
            match self.orders.get_mut(order_id) {
                Some(mut order) if order.leaves > 0.0 => {
                    order.leaves = 0.0;
                    true
                }
                Some(_) => false,
                None => {
                    warn!(order = %order_id, "Cancel for unknown order ignored");
                    false
                }
            }
        };
        if closed {
            info!(order = %order_id, "Order canceled");
            self.broadcast_order(OrderEvent::Updated {
                order_id: order_id.clone(),
                fields: FieldMap::new().with_numeric(names::LEAVES, 0.0),
            });
        }
    }

    fn register_subscriber<E: Send + 'static>(
        &self,
        subscribers: &Subscribers<E>,
        snapshot: Vec<E>,
    ) -> (u64, EventStream<E>) {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in snapshot {
            let _ = tx.send(Ok(event));
        }
        let sub_id = self.next_sub_id.fetch_add(1, Ordering::Relaxed);
        subscribers.insert(sub_id, tx);
        let stream = Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        }));
        (sub_id, stream)
    }

    /// Tie a subscription's lifetime to its request channel: when the
    /// client closes the channel, the event stream ends.
    fn watch_request_channel<R>(
        &self,
        sub_id: u64,
        mut requests: RequestStream<R>,
        remove: fn(&SimulatedTms, u64),
    ) where
        R: Send + 'static,
    {
        let weak = self.self_ref.clone();
        tokio::spawn(async move {
            while requests.recv().await.is_some() {
                // Additional request messages on an open subscription are
                // accepted and ignored.
            }
            if let Some(sim) = weak.upgrade() {
                remove(&sim, sub_id);
                debug!(sub_id, "Subscription closed by client");
            }
        });
    }
}

#[async_trait]
impl TradingService for SimulatedTms {
    async fn login(&self, request: LoginRequest) -> RemoteResult<()> {
        info!(user = %request.user, "Login");
        self.logged_in.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn create_market_portfolio(
        &self,
        request: CreateMarketPortfolioRequest,
    ) -> RemoteResult<()> {
        self.require_login()?;
        if self.portfolios.contains_key(&request.name) {
            return Err(RemoteError::rejected(
                error_codes::CANNOT_CREATE_PORTFOLIO,
                format!("portfolio '{}' already exists", request.name),
            ));
        }
        info!(portfolio = %request.name, "Portfolio created");
        self.portfolios.insert(request.name, FieldMap::new());
        Ok(())
    }

    async fn modify_market_portfolio(&self, request: ModifyPortfolioRequest) -> RemoteResult<()> {
        self.require_login()?;
        match self.portfolios.get_mut(&request.name) {
            Some(mut fields) => {
                fields.merge(&request.fields);
                Ok(())
            }
            None => Err(RemoteError::rejected(
                "PortfolioNotFound",
                format!("portfolio '{}' does not exist", request.name),
            )),
        }
    }

    async fn remove_market_portfolio(&self, request: RemovePortfolioRequest) -> RemoteResult<()> {
        self.require_login()?;
        match self.portfolios.remove(&request.name) {
            Some(_) => Ok(()),
            None => Err(RemoteError::rejected(
                "PortfolioNotFound",
                format!("portfolio '{}' does not exist", request.name),
            )),
        }
    }

    async fn add_market_targets(&self, request: AddTargetsRequest) -> RemoteResult<Vec<TargetId>> {
        self.require_login()?;
        if !self.portfolios.contains_key(&request.portfolio) {
            return Err(RemoteError::rejected(
                "PortfolioNotFound",
                format!("portfolio '{}' does not exist", request.portfolio),
            ));
        }

        // Validate every row first; reject the whole call with per-row
        // child messages the way the real service reports batch failures.
        let mut child_messages = Vec::new();
        for (row, fields) in request.fields.iter().enumerate() {
            if fields.string(names::INSTRUMENT).is_none() {
                child_messages.push(format!("row {row}: missing Instrument"));
            }
            if fields.numeric(names::TGT_QTY).unwrap_or(0.0) <= 0.0 {
                child_messages.push(format!("row {row}: TgtQty must be positive"));
            }
        }
        if !child_messages.is_empty() {
            return Err(RemoteError::Rejected {
                message: "cannot create targets".to_string(),
                details: ErrorDetails {
                    exception_class: Some("ValidationException".to_string()),
                    error_code: Some("CannotCreateTargets".to_string()),
                    child_messages,
                },
            });
        }

        let mut ids = Vec::with_capacity(request.fields.len());
        for fields in &request.fields {
            let target_id = TargetId::new(self.next_target_id.fetch_add(1, Ordering::Relaxed));
            let tgt_qty = fields.numeric(names::TGT_QTY).unwrap_or(0.0);
            let target = SimTarget {
                portfolio: request.portfolio.clone(),
                instrument: fields
                    .string(names::INSTRUMENT)
                    .unwrap_or_default()
                    .to_string(),
                tgt_qty,
                unreleased: tgt_qty,
                wave_size_type: WaveSizeType::PctTgtQty,
                wave_size: self.config.default_wave_size_pct,
                terminated: false,
            };
            let snapshot = Self::target_snapshot_fields(target_id, &target);
            info!(
                target = %target_id,
                portfolio = %target.portfolio,
                instrument = %target.instrument,
                tgt_qty,
                "Target created"
            );
            self.targets.insert(target_id, target);
            self.broadcast_target(TargetEvent::Added {
                target_id,
                fields: snapshot,
            });
            ids.push(target_id);
        }
        Ok(ids)
    }

    async fn modify_market_targets(&self, request: ModifyTargetsRequest) -> RemoteResult<()> {
        self.require_login()?;
        for (index, target_id) in request.target_ids.iter().enumerate() {
            let message = if request.fields.len() == 1 {
                &request.fields[0]
            } else {
                request.fields.get(index).ok_or_else(|| {
                    RemoteError::rejected("InvalidRequest", "fewer messages than target ids")
                })?
            };
            self.apply_target_modification(*target_id, message)?;
        }
        Ok(())
    }

    async fn pause_market_targets(&self, request: PauseMarketTargetsRequest) -> RemoteResult<()> {
        self.require_login()?;
        for target_id in request.target_ids {
            if request.cancel_open_orders {
                self.cancel_target_orders(target_id);
            }
            self.broadcast_target(TargetEvent::Paused { target_id });
        }
        Ok(())
    }

    async fn resume_market_targets(
        &self,
        request: ResumeMarketTargetsRequest,
    ) -> RemoteResult<()> {
        self.require_login()?;
        for target_id in request.target_ids {
            self.broadcast_target(TargetEvent::Resumed { target_id });
        }
        Ok(())
    }

    async fn terminate_market_targets(
        &self,
        request: TerminateMarketTargetsRequest,
    ) -> RemoteResult<()> {
        self.require_login()?;
        for target_id in request.target_ids {
            if let Some(mut target) = self.targets.get_mut(&target_id) {
                target.terminated = true;
                target.unreleased = 0.0;
            }
            if request.cancel_open_orders {
                self.cancel_target_orders(target_id);
            }
            self.broadcast_target(TargetEvent::Terminated { target_id });
        }
        Ok(())
    }

    async fn remove_market_targets(&self, request: TargetIds) -> RemoteResult<()> {
        self.require_login()?;
        for target_id in request.target_ids {
            self.targets.remove(&target_id);
            self.broadcast_target(TargetEvent::Removed { target_id });
        }
        Ok(())
    }

    async fn send_orders(&self, request: SendOrdersRequest) -> RemoteResult<()> {
        self.require_login()?;
        if !request.messages.is_empty() {
            warn!("Simulator ignores non-target order messages");
        }
        for target_id in request.target_ids {
            self.release_wave(target_id);
        }
        Ok(())
    }

    async fn modify_orders(&self, request: ModifyOrdersRequest) -> RemoteResult<()> {
        self.require_login()?;
        for (index, order_id) in request.order_ids.iter().enumerate() {
            let message = if request.messages.len() == 1 {
                &request.messages[0]
            } else {
                request.messages.get(index).ok_or_else(|| {
                    RemoteError::rejected("InvalidRequest", "fewer messages than order ids")
                })?
            };
            let applied = {
                match self.orders.get_mut(order_id) {
                    Some(mut order) if order.leaves > 0.0 => {
                        if let Some(price) = message.numeric(names::PRICE) {
                            order.price = price;
                        }
                        if let Some(raw) = message.numeric(names::ORD_TYPE) {
                            if let Some(ord_type) = OrdType::from_field(raw) {
                                order.ord_type = ord_type;
                                if ord_type == OrdType::Market {
                                    order.price = 0.0;
                                }
                            }
                        }
                        Some((order.leaves, order.price, order.ord_type))
                    }
                    Some(_) => {
                        debug!(order = %order_id, "Modify for closed order ignored");
                        None
                    }
                    None => {
                        warn!(order = %order_id, "Modify for unknown order ignored");
                        None
                    }
                }
            };
            if let Some((leaves, price, ord_type)) = applied {
                self.broadcast_order(OrderEvent::Updated {
                    order_id: order_id.clone(),
                    fields: FieldMap::new()
                        .with_numeric(names::LEAVES, leaves)
                        .with_numeric(names::ORD_PX, price)
                        .with_numeric(names::ORD_TYPE, ord_type.as_field()),
                });
            }
        }
        Ok(())
    }

    async fn cancel_orders(&self, request: CancelOrdersRequest) -> RemoteResult<()> {
        self.require_login()?;
        for order_id in request.order_ids {
            self.close_order(&order_id);
        }
        Ok(())
    }

    async fn post_alert_message(&self, request: PostAlertMessageRequest) -> RemoteResult<()> {
        self.require_login()?;
        info!(
            users = ?request.users,
            alert_type = %request.alert_type,
            description = %request.description,
            "Alert posted"
        );
        self.alerts.lock().push(request);
        Ok(())
    }

    async fn subscribe_market_targets(
        &self,
        mut requests: RequestStream<SubscribeForTargetsRequest>,
    ) -> RemoteResult<EventStream<TargetEvent>> {
        self.require_login()?;
        let Some(request) = requests.recv().await else {
            return Err(RemoteError::Stream(
                "request channel closed before subscribing".to_string(),
            ));
        };
        debug!(filter = %request.filter, "Target subscription opened");

        let mut snapshot: Vec<TargetEvent> = self
            .targets
            .iter()
            .map(|entry| TargetEvent::Added {
                target_id: *entry.key(),
                fields: Self::target_snapshot_fields(*entry.key(), entry.value()),
            })
            .collect();
        snapshot.push(TargetEvent::Feed(FeedStatus::InitialStateReceived));

        let (sub_id, stream) = self.register_subscriber(&self.target_subs, snapshot);
        self.watch_request_channel(sub_id, requests, |sim, id| {
            sim.target_subs.remove(&id);
        });
        Ok(stream)
    }

    async fn subscribe_orders(
        &self,
        mut requests: RequestStream<SubscribeForOrdersRequest>,
    ) -> RemoteResult<EventStream<OrderEvent>> {
        self.require_login()?;
        let Some(request) = requests.recv().await else {
            return Err(RemoteError::Stream(
                "request channel closed before subscribing".to_string(),
            ));
        };
        debug!(filter = %request.filter, "Order subscription opened");

        let mut snapshot: Vec<OrderEvent> = self
            .orders
            .iter()
            .filter(|entry| entry.value().leaves > 0.0)
            .map(|entry| OrderEvent::Added {
                order_id: entry.key().clone(),
                fields: Self::order_snapshot_fields(entry.value()),
            })
            .collect();
        snapshot.push(OrderEvent::Feed(FeedStatus::InitialStateReceived));

        let (sub_id, stream) = self.register_subscriber(&self.order_subs, snapshot);
        self.watch_request_channel(sub_id, requests, |sim, id| {
            sim.order_subs.remove(&id);
        });
        Ok(stream)
    }

    async fn subscribe_market_data(
        &self,
        mut requests: RequestStream<SubscribeForMarketDataRequest>,
    ) -> RemoteResult<EventStream<MarketDataEvent>> {
        self.require_login()?;
        let Some(request) = requests.recv().await else {
            return Err(RemoteError::Stream(
                "request channel closed before subscribing".to_string(),
            ));
        };
        debug!(instruments = ?request.instruments, "Market data subscription opened");

        let mut snapshot: Vec<MarketDataEvent> = request
            .instruments
            .iter()
            .filter_map(|instrument| {
                self.config.instrument_prices.get(instrument).map(|last_px| {
                    MarketDataEvent::Update {
                        instrument: instrument.clone(),
                        fields: FieldMap::new()
                            .with_numeric(names::LAST_PX, *last_px)
                            .with_numeric(names::MID_PX, last_px - self.config.mid_px_offset),
                    }
                })
            })
            .collect();
        snapshot.push(MarketDataEvent::Feed(FeedStatus::InitialStateReceived));

        let (sub_id, stream) = self.register_subscriber(&self.market_data_subs, snapshot);
        self.watch_request_channel(sub_id, requests, |sim, id| {
            sim.market_data_subs.remove(&id);
        });
        Ok(stream)
    }
}
