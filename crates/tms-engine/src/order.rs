//! Order lifecycle: limit → mid → market price escalation.
//!
//! Escalation is a fixed two-step policy driven by dwell time and
//! pre-empted by a large adverse price move:
//! - on open, a mid-price timer is armed; when it fires (or a market-data
//!   event shows the last price more than the configured fraction away from
//!   the working price) the order is repriced to the cached mid price and a
//!   market timer is armed
//! - when the market timer fires the order becomes a market order
//! - a zero-leaves update closes the order, cancels both timers, and
//!   notifies the owning target
//!
//! The timer-handle fields are the sole point of race between the order
//! stream, the market-data stream, and the scheduler task; cancel-after-fire
//! being a no-op makes every interleaving safe, and a repeated mid-price
//! escalation is an accepted no-op override.

use crate::rpc::fire_and_forget;
use crate::scheduler::{ActionScheduler, ScheduledHandle};
use crate::target::Target;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tms_core::{fields::names, FieldMap, OrdType, OrderId};
use tms_remote::{DynTradingService, ModifyOrdersRequest, TradingService};
use tracing::{info, warn};

/// Price-escalation timing and sensitivity.
#[derive(Debug, Clone, Copy)]
pub struct EscalationConfig {
    /// Dwell time before walking the price to mid.
    pub mid_px_timeout: Duration,
    /// Dwell time at mid before going to market.
    pub market_timeout: Duration,
    /// Relative last-price deviation that forces the mid-price step early.
    pub max_px_deviation: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            mid_px_timeout: Duration::from_secs(2),
            market_timeout: Duration::from_secs(3),
            max_px_deviation: 0.01,
        }
    }
}

struct OrderState {
    /// Working price; zero denotes a market order with no limit.
    price: f64,
    /// Last known mid price for the instrument, if any.
    mid_px: Option<f64>,
    closed: bool,
    midpx_timer: Option<ScheduledHandle>,
    market_timer: Option<ScheduledHandle>,
}

/// One exchange order's price-escalation state machine.
pub struct Order {
    id: OrderId,
    target: Arc<Target>,
    service: DynTradingService,
    scheduler: Arc<ActionScheduler>,
    config: EscalationConfig,
    /// Self-reference handed to timer closures; a fired timer on a dropped
    /// order is a no-op.
    self_ref: Weak<Order>,
    state: Mutex<OrderState>,
}

impl Order {
    /// Register an order from its "added" event.
    ///
    /// Records the limit price and current mid price (when known), arms the
    /// mid-price timer, notifies the owning target, then immediately applies
    /// the initial fill state — an order can arrive already closed.
    #[must_use]
    pub fn open(
        id: OrderId,
        target: Arc<Target>,
        fields: &FieldMap,
        market_data: Option<&FieldMap>,
        service: DynTradingService,
        scheduler: Arc<ActionScheduler>,
        config: EscalationConfig,
    ) -> Arc<Self> {
        let price = fields.numeric(names::ORD_PX).unwrap_or_else(|| {
            warn!(order = %id, "Order added without OrdPx, treating as market");
            0.0
        });
        let mid_px = market_data.and_then(|md| md.numeric(names::MID_PX));

        let order = Arc::new_cyclic(|weak: &Weak<Order>| Self {
            id,
            target,
            service,
            scheduler,
            config,
            self_ref: weak.clone(),
            state: Mutex::new(OrderState {
                price,
                mid_px,
                closed: false,
                midpx_timer: None,
                market_timer: None,
            }),
        });

        let timer = {
            let this = order.self_ref.clone();
            order
                .scheduler
                .schedule(order.config.mid_px_timeout, 1, move || {
                    if let Some(order) = this.upgrade() {
                        order.escalate_to_midpx(true);
                    }
                })
        };
        order.state.lock().midpx_timer = Some(timer);

        info!(
            order = %order.id,
            target = %order.target.id(),
            price,
            "New order added"
        );
        order.target.on_order_added(&order.id);
        // The order may already be fully filled on arrival.
        order.on_updated(fields);
        order
    }

    /// Order id.
    #[must_use]
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    /// Working price; zero denotes a market order.
    #[must_use]
    pub fn price(&self) -> f64 {
        self.state.lock().price
    }

    /// Last cached mid price, if any.
    #[must_use]
    pub fn mid_px(&self) -> Option<f64> {
        self.state.lock().mid_px
    }

    /// Whether the order has closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Whether a market timer is currently armed.
    #[must_use]
    pub fn has_market_timer(&self) -> bool {
        self.state.lock().market_timer.is_some()
    }

    /// Apply an order "updated" event.
    ///
    /// A zero-leaves update closes the order; repeating it is a no-op.
    pub fn on_updated(&self, fields: &FieldMap) {
        let Some(leaves) = fields.numeric(names::LEAVES) else {
            return;
        };
        if leaves != 0.0 {
            return;
        }
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            if let Some(timer) = state.midpx_timer.take() {
                timer.cancel();
            }
            if let Some(timer) = state.market_timer.take() {
                timer.cancel();
            }
        }
        info!(order = %self.id, "Order is closed");
        self.target.on_order_closed(&self.id);
    }

    /// Apply a market-data event for this order's instrument.
    ///
    /// Refreshes the cached mid price; while the order still carries a
    /// limit price, a last price more than the configured fraction away
    /// forces the mid-price step without waiting for the timer.
    pub fn on_market_data(&self, fields: &FieldMap) {
        let forced = {
            let mut state = self.state.lock();
            if let Some(mid_px) = fields.numeric(names::MID_PX) {
                state.mid_px = Some(mid_px);
            }
            if state.closed || state.price <= 0.0 {
                false
            } else {
                match fields.numeric(names::LAST_PX) {
                    Some(last_px) if last_px != 0.0 => {
                        ((last_px - state.price) / last_px).abs() > self.config.max_px_deviation
                    }
                    _ => false,
                }
            }
        };
        if forced {
            info!(
                order = %self.id,
                last_px = fields.numeric(names::LAST_PX),
                "Market price for order changed significantly"
            );
            self.escalate_to_midpx(false);
        }
    }

    /// Walk the order's price to the cached mid price and arm the market
    /// timer.
    ///
    /// Fires from the mid-price timer or a forced market-data escalation;
    /// both may race, in which case the second send is a no-op override.
    fn escalate_to_midpx(&self, from_timer: bool) {
        let mid_px = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            if let Some(timer) = state.midpx_timer.take() {
                if !from_timer {
                    timer.cancel();
                }
            }
            if state.market_timer.is_none() {
                let this = self.self_ref.clone();
                state.market_timer =
                    Some(self.scheduler.schedule(self.config.market_timeout, 1, move || {
                        if let Some(order) = this.upgrade() {
                            order.escalate_to_market();
                        }
                    }));
            }
            if let Some(mid_px) = state.mid_px {
                state.price = mid_px;
            }
            state.mid_px
        };

        match mid_px {
            Some(mid_px) => {
                info!(order = %self.id, mid_px, "Changing order price to MidPx");
                let service = self.service.clone();
                let request = ModifyOrdersRequest::single(
                    self.id.clone(),
                    FieldMap::new().with_numeric(names::PRICE, mid_px),
                );
                fire_and_forget("modifyOrders", async move {
                    service.modify_orders(request).await
                });
            }
            None => {
                warn!(order = %self.id, "No mid price known yet, skipping price change");
            }
        }
    }

    /// Drop the limit entirely: zero the local price and modify the live
    /// order to a market order. Fires from the market timer only.
    fn escalate_to_market(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.market_timer = None;
            state.price = 0.0;
        }
        info!(order = %self.id, "Changing order type to market");
        let service = self.service.clone();
        let request = ModifyOrdersRequest::single(
            self.id.clone(),
            FieldMap::new().with_numeric(names::ORD_TYPE, OrdType::Market.as_field()),
        );
        fire_and_forget("modifyOrders", async move {
            service.modify_orders(request).await
        });
    }
}
