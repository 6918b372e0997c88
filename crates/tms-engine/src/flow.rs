//! Event routing from subscriptions into the trading book.
//!
//! One `TradingFlow` serves all three subscriptions. Target and order
//! mutation happens only here (consumer callbacks) and in scheduler-fired
//! actions; events within one subscription are handled strictly in arrival
//! order on that subscription's consumer task.

use crate::book::TradingBook;
use crate::error::EngineError;
use crate::latch::CompletionLatch;
use crate::order::{EscalationConfig, Order};
use crate::scheduler::ActionScheduler;
use crate::target::Target;
use std::sync::Arc;
use tms_core::{fields::names, TargetId};
use tms_remote::{DynTradingService, MarketDataEvent, OrderEvent, TargetEvent};
use tracing::{debug, info, warn};

/// Routes subscription events to the target/order state machines.
pub struct TradingFlow {
    book: Arc<TradingBook>,
    service: DynTradingService,
    scheduler: Arc<ActionScheduler>,
    latch: Arc<CompletionLatch>,
    escalation: EscalationConfig,
    alert_user: String,
}

impl TradingFlow {
    /// Wire a flow over explicitly provided registries and collaborators.
    #[must_use]
    pub fn new(
        book: Arc<TradingBook>,
        service: DynTradingService,
        scheduler: Arc<ActionScheduler>,
        latch: Arc<CompletionLatch>,
        escalation: EscalationConfig,
        alert_user: impl Into<String>,
    ) -> Self {
        Self {
            book,
            service,
            scheduler,
            latch,
            escalation,
            alert_user: alert_user.into(),
        }
    }

    /// Shared registries.
    #[must_use]
    pub fn book(&self) -> &Arc<TradingBook> {
        &self.book
    }

    /// Completion latch shared with the initiating task.
    #[must_use]
    pub fn latch(&self) -> &Arc<CompletionLatch> {
        &self.latch
    }

    /// Handle one event from the market-targets subscription.
    pub fn handle_target_event(&self, event: TargetEvent) -> Result<(), EngineError> {
        match event {
            TargetEvent::Added { target_id, fields } => {
                info!(target = %target_id, "New target added");
                let target = Target::new(
                    target_id,
                    &fields,
                    self.service.clone(),
                    self.latch.clone(),
                    self.alert_user.clone(),
                );
                if self.book.insert_target(target).is_some() {
                    warn!(target = %target_id, "Target was already registered, replaced");
                }
                Ok(())
            }
            TargetEvent::Updated { target_id, fields } => {
                let target = self
                    .book
                    .target(&target_id)
                    .ok_or(EngineError::UnknownTarget(target_id))?;
                target.on_updated(&fields);
                Ok(())
            }
            TargetEvent::Removed { target_id }
            | TargetEvent::FilteredOut { target_id }
            | TargetEvent::Paused { target_id }
            | TargetEvent::Resumed { target_id }
            | TargetEvent::Terminated { target_id } => {
                debug!(target = %target_id, "Ignoring target lifecycle event");
                Ok(())
            }
            TargetEvent::Feed(status) => {
                info!(subscription = "market-targets", %status, "Feed status changed");
                Ok(())
            }
        }
    }

    /// Handle one event from the orders subscription.
    pub fn handle_order_event(&self, event: OrderEvent) -> Result<(), EngineError> {
        match event {
            OrderEvent::Added { order_id, fields } => {
                let target_id = fields
                    .numeric(names::TGT_ID)
                    .map(TargetId::from_field)
                    .ok_or(EngineError::MissingField(names::TGT_ID))?;
                let instrument = fields
                    .string(names::INSTRUMENT)
                    .ok_or(EngineError::MissingField(names::INSTRUMENT))?
                    .to_string();
                let target = self
                    .book
                    .target(&target_id)
                    .ok_or(EngineError::UnknownTarget(target_id))?;
                let market_data = self.book.market_data(&instrument);

                let order = Order::open(
                    order_id,
                    target,
                    &fields,
                    market_data.as_ref(),
                    self.service.clone(),
                    self.scheduler.clone(),
                    self.escalation,
                );
                if self.book.insert_order(order, &instrument).is_some() {
                    warn!("Order was already registered, replaced");
                }
                Ok(())
            }
            OrderEvent::Updated { order_id, fields } => {
                let order = self
                    .book
                    .order(&order_id)
                    .ok_or(EngineError::UnknownOrder(order_id))?;
                order.on_updated(&fields);
                Ok(())
            }
            OrderEvent::Removed { order_id } => {
                debug!(order = %order_id, "Ignoring order removal event");
                Ok(())
            }
            OrderEvent::Feed(status) => {
                info!(subscription = "orders", %status, "Feed status changed");
                Ok(())
            }
        }
    }

    /// Handle one event from the market-data subscription.
    pub fn handle_market_data_event(&self, event: MarketDataEvent) -> Result<(), EngineError> {
        match event {
            MarketDataEvent::Update { instrument, fields } => {
                self.book.update_market_data(&instrument, fields.clone());
                for order in self.book.orders_for_instrument(&instrument) {
                    order.on_market_data(&fields);
                }
                Ok(())
            }
            MarketDataEvent::Feed(status) => {
                info!(subscription = "market-data", %status, "Feed status changed");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tms_core::{FieldMap, OrderId};
    use tms_remote::testing::RecordingService;
    use tms_remote::FeedStatus;

    struct Fixture {
        service: Arc<RecordingService>,
        flow: TradingFlow,
        latch: Arc<CompletionLatch>,
    }

    fn fixture(latch_count: usize) -> Fixture {
        let service = Arc::new(RecordingService::new());
        let scheduler = Arc::new(ActionScheduler::new());
        let _ = scheduler.clone().spawn();
        let latch = Arc::new(CompletionLatch::new(latch_count));
        let flow = TradingFlow::new(
            Arc::new(TradingBook::new()),
            service.clone(),
            scheduler,
            latch.clone(),
            EscalationConfig::default(),
            "demo",
        );
        Fixture {
            service,
            flow,
            latch,
        }
    }

    fn added_target(id: i64, unreleased: f64) -> TargetEvent {
        TargetEvent::Added {
            target_id: TargetId::new(id),
            fields: FieldMap::new().with_numeric(names::UNRELEASED, unreleased),
        }
    }

    fn added_order(id: &str, target_id: i64, price: f64, leaves: f64) -> OrderEvent {
        OrderEvent::Added {
            order_id: OrderId::new(id),
            fields: FieldMap::new()
                .with_numeric(names::TGT_ID, target_id as f64)
                .with_string(names::INSTRUMENT, "IBM")
                .with_numeric(names::ORD_PX, price)
                .with_numeric(names::LEAVES, leaves),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_then_order_then_fill_completes() {
        let fx = fixture(1);
        fx.flow.handle_target_event(added_target(1, 100.0)).unwrap();
        fx.flow
            .handle_order_event(added_order("ord-1", 1, 50.0, 100.0))
            .unwrap();

        // Wave fully released once the order is open.
        fx.flow
            .handle_target_event(TargetEvent::Updated {
                target_id: TargetId::new(1),
                fields: FieldMap::new().with_numeric(names::UNRELEASED, 0.0),
            })
            .unwrap();

        fx.flow
            .handle_order_event(OrderEvent::Updated {
                order_id: OrderId::new("ord-1"),
                fields: FieldMap::new().with_numeric(names::LEAVES, 0.0),
            })
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(fx.latch.count(), 0);
        assert_eq!(fx.service.alerts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_for_unknown_target_is_an_error() {
        let fx = fixture(1);
        let result = fx.flow.handle_target_event(TargetEvent::Updated {
            target_id: TargetId::new(9),
            fields: FieldMap::new(),
        });
        assert!(matches!(result, Err(EngineError::UnknownTarget(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_for_unknown_target_is_an_error() {
        let fx = fixture(1);
        let result = fx
            .flow
            .handle_order_event(added_order("ord-1", 9, 50.0, 100.0));
        assert!(matches!(result, Err(EngineError::UnknownTarget(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_added_without_instrument_is_an_error() {
        let fx = fixture(1);
        fx.flow.handle_target_event(added_target(1, 100.0)).unwrap();
        let result = fx.flow.handle_order_event(OrderEvent::Added {
            order_id: OrderId::new("ord-1"),
            fields: FieldMap::new().with_numeric(names::TGT_ID, 1.0),
        });
        assert!(matches!(
            result,
            Err(EngineError::MissingField(names::INSTRUMENT))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_market_data_reaches_orders_on_instrument() {
        let fx = fixture(1);
        fx.flow.handle_target_event(added_target(1, 100.0)).unwrap();
        fx.flow
            .handle_order_event(added_order("ord-1", 1, 50.0, 100.0))
            .unwrap();

        fx.flow
            .handle_market_data_event(MarketDataEvent::Update {
                instrument: "IBM".to_string(),
                fields: FieldMap::new()
                    .with_numeric(names::LAST_PX, 45.0)
                    .with_numeric(names::MID_PX, 44.9),
            })
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Deviation beyond threshold forces the mid-price step.
        let order = fx.flow.book().order(&OrderId::new("ord-1")).unwrap();
        assert_eq!(order.price(), 44.9);
        assert_eq!(fx.service.order_modifications().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_market_data_for_other_instrument_is_cached_only() {
        let fx = fixture(1);
        fx.flow
            .handle_market_data_event(MarketDataEvent::Update {
                instrument: "MSFT".to_string(),
                fields: FieldMap::new().with_numeric(names::MID_PX, 99.5),
            })
            .unwrap();

        let cached = fx.flow.book().market_data("MSFT").unwrap();
        assert_eq!(cached.numeric(names::MID_PX), Some(99.5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_order_seeds_mid_px_from_cache() {
        let fx = fixture(1);
        fx.flow.handle_target_event(added_target(1, 100.0)).unwrap();
        fx.flow
            .handle_market_data_event(MarketDataEvent::Update {
                instrument: "IBM".to_string(),
                fields: FieldMap::new()
                    .with_numeric(names::LAST_PX, 50.0)
                    .with_numeric(names::MID_PX, 49.9),
            })
            .unwrap();

        fx.flow
            .handle_order_event(added_order("ord-1", 1, 50.0, 100.0))
            .unwrap();

        let order = fx.flow.book().order(&OrderId::new("ord-1")).unwrap();
        assert_eq!(order.mid_px(), Some(49.9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_status_events_are_logged_not_fatal() {
        let fx = fixture(1);
        fx.flow
            .handle_target_event(TargetEvent::Feed(FeedStatus::Disconnected))
            .unwrap();
        fx.flow
            .handle_order_event(OrderEvent::Feed(FeedStatus::Reconnected))
            .unwrap();
        fx.flow
            .handle_market_data_event(MarketDataEvent::Feed(FeedStatus::InitialStateReceived))
            .unwrap();
    }
}
