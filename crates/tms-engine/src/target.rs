//! Target lifecycle: quantity release, stop handling, completion.
//!
//! A target releases quantity into the market through at most one open
//! order at a time. When an order closes it either requests the next wave
//! (quantity remains unreleased) or completes, alerting the user and
//! decrementing the shared completion latch exactly once. A `STOP` text
//! update suspends the target permanently: unreleased is pinned at zero and
//! the open order, if any, is canceled.

use crate::latch::CompletionLatch;
use crate::rpc::fire_and_forget;
use parking_lot::Mutex;
use std::sync::Arc;
use tms_core::{fields::names, FieldMap, OrderId, TargetId};
use tms_remote::{
    CancelOrdersRequest, DynTradingService, PostAlertMessageRequest, SendOrdersRequest,
    TradingService,
};
use tracing::{info, warn};

/// Text-field sentinel that stops a target.
pub const STOP_TEXT: &str = "STOP";

struct TargetState {
    unreleased: f64,
    stopped: bool,
    open_order: Option<OrderId>,
    completed: bool,
}

enum CloseOutcome {
    NextWave,
    Complete,
    MismatchedOrder,
    NoOpenOrder,
    AlreadyComplete,
}

/// One market target's lifecycle state machine.
///
/// Mutated from the target-stream consumer and from its order's close
/// callback; every mutation is a short check-and-update section behind the
/// state mutex, with outbound RPCs issued after the lock is released.
pub struct Target {
    id: TargetId,
    service: DynTradingService,
    latch: Arc<CompletionLatch>,
    alert_user: String,
    state: Mutex<TargetState>,
}

impl Target {
    /// Register a target from its "added" event.
    #[must_use]
    pub fn new(
        id: TargetId,
        fields: &FieldMap,
        service: DynTradingService,
        latch: Arc<CompletionLatch>,
        alert_user: impl Into<String>,
    ) -> Arc<Self> {
        let unreleased = fields.numeric(names::UNRELEASED).unwrap_or_else(|| {
            warn!(target = %id, "Target added without Unreleased, assuming zero");
            0.0
        });
        Arc::new(Self {
            id,
            service,
            latch,
            alert_user: alert_user.into(),
            state: Mutex::new(TargetState {
                unreleased,
                stopped: false,
                open_order: None,
                completed: false,
            }),
        })
    }

    /// Target id.
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Remaining quantity not yet sent to market.
    #[must_use]
    pub fn unreleased(&self) -> f64 {
        self.state.lock().unreleased
    }

    /// Whether the target has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Whether the target has completed and decremented the latch.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state.lock().completed
    }

    /// Currently open order id, if any.
    #[must_use]
    pub fn open_order(&self) -> Option<OrderId> {
        self.state.lock().open_order.clone()
    }

    /// Apply a target "updated" event.
    pub fn on_updated(&self, fields: &FieldMap) {
        let stop_requested = fields.string(names::TEXT) == Some(STOP_TEXT);
        let open_order = {
            let mut state = self.state.lock();
            if !state.stopped {
                if let Some(unreleased) = fields.numeric(names::UNRELEASED) {
                    state.unreleased = unreleased;
                }
            }
            if !stop_requested {
                return;
            }
            // Stopped is absorbing: pin unreleased at zero for good.
            state.stopped = true;
            state.unreleased = 0.0;
            state.open_order.clone()
        };

        match open_order {
            Some(order_id) => {
                info!(target = %self.id, order = %order_id, "Stopping target");
                let service = self.service.clone();
                fire_and_forget("cancelOrders", async move {
                    service
                        .cancel_orders(CancelOrdersRequest::single(order_id))
                        .await
                });
            }
            None => {
                warn!(target = %self.id, "Cannot stop target, it has no open orders");
            }
        }
    }

    /// Record a newly opened order for this target.
    pub fn on_order_added(&self, order_id: &OrderId) {
        let (had_open_order, stopped) = {
            let mut state = self.state.lock();
            let had_open_order = state.open_order.is_some();
            state.open_order = Some(order_id.clone());
            (had_open_order, state.stopped)
        };

        if had_open_order {
            warn!(target = %self.id, order = %order_id, "Target already has an open order");
        }
        if stopped {
            // A stop raced with an in-flight order placement.
            warn!(
                target = %self.id,
                order = %order_id,
                "New order added to already stopped target, canceling"
            );
            let service = self.service.clone();
            let order_id = order_id.clone();
            fire_and_forget("cancelOrders", async move {
                service
                    .cancel_orders(CancelOrdersRequest::single(order_id))
                    .await
            });
        }
    }

    /// Handle the close of this target's order.
    pub fn on_order_closed(&self, order_id: &OrderId) {
        let outcome = {
            let mut state = self.state.lock();
            match state.open_order.as_ref() {
                Some(open) if open == order_id => {
                    state.open_order = None;
                    if state.unreleased > 0.0 {
                        CloseOutcome::NextWave
                    } else if state.completed {
                        CloseOutcome::AlreadyComplete
                    } else {
                        state.completed = true;
                        CloseOutcome::Complete
                    }
                }
                Some(_) => CloseOutcome::MismatchedOrder,
                None => CloseOutcome::NoOpenOrder,
            }
        };

        match outcome {
            CloseOutcome::NextWave => {
                info!(target = %self.id, "Requesting next wave");
                let service = self.service.clone();
                let request = SendOrdersRequest::for_target(self.id);
                fire_and_forget("sendOrders", async move { service.send_orders(request).await });
            }
            CloseOutcome::Complete => self.complete(),
            CloseOutcome::AlreadyComplete => {}
            CloseOutcome::MismatchedOrder => {
                warn!(target = %self.id, order = %order_id, "Target has another open order");
            }
            CloseOutcome::NoOpenOrder => {
                warn!(target = %self.id, order = %order_id, "Target has no open order");
            }
        }
    }

    fn complete(&self) {
        info!(target = %self.id, "Target is completed");
        let service = self.service.clone();
        let alert = PostAlertMessageRequest::info(
            self.alert_user.as_str(),
            format!("Target {} is completed", self.id),
        );
        fire_and_forget("postAlertMessage", async move {
            service.post_alert_message(alert).await
        });
        self.latch.count_down();
    }
}
