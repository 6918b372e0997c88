//! Shared registries for live trading state.
//!
//! Owned mapping containers passed explicitly to the event flow — no
//! globals. The maps are sharded (`DashMap`) because "added" events for
//! different subscriptions insert concurrently; each entry's entity is
//! otherwise only touched by the handlers that hold a reference to it.

use crate::order::Order;
use crate::target::Target;
use dashmap::DashMap;
use std::sync::Arc;
use tms_core::{FieldMap, OrderId, TargetId};

/// Id-keyed registries for targets, orders, and cached market data.
#[derive(Default)]
pub struct TradingBook {
    targets: DashMap<TargetId, Arc<Target>>,
    orders: DashMap<OrderId, Arc<Order>>,
    orders_by_instrument: DashMap<String, Vec<Arc<Order>>>,
    market_data: DashMap<String, FieldMap>,
}

impl TradingBook {
    /// Create empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target; returns the replaced entry if the id was already
    /// present.
    pub fn insert_target(&self, target: Arc<Target>) -> Option<Arc<Target>> {
        self.targets.insert(target.id(), target)
    }

    /// Look up a target by id.
    #[must_use]
    pub fn target(&self, id: &TargetId) -> Option<Arc<Target>> {
        self.targets.get(id).map(|entry| entry.value().clone())
    }

    /// Number of registered targets.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Register an order and index it under its instrument; returns the
    /// replaced entry if the id was already present.
    pub fn insert_order(&self, order: Arc<Order>, instrument: &str) -> Option<Arc<Order>> {
        self.orders_by_instrument
            .entry(instrument.to_string())
            .or_default()
            .push(order.clone());
        self.orders.insert(order.id().clone(), order)
    }

    /// Look up an order by id.
    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<Arc<Order>> {
        self.orders.get(id).map(|entry| entry.value().clone())
    }

    /// Number of registered orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Orders ever opened on an instrument; closed orders ignore market
    /// data on their own.
    #[must_use]
    pub fn orders_for_instrument(&self, instrument: &str) -> Vec<Arc<Order>> {
        self.orders_by_instrument
            .get(instrument)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Cache the latest market-data fields for an instrument.
    pub fn update_market_data(&self, instrument: &str, fields: FieldMap) {
        self.market_data.insert(instrument.to_string(), fields);
    }

    /// Latest cached market-data fields for an instrument.
    #[must_use]
    pub fn market_data(&self, instrument: &str) -> Option<FieldMap> {
        self.market_data
            .get(instrument)
            .map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_core::fields::names;

    #[test]
    fn test_market_data_cache_replaces() {
        let book = TradingBook::new();
        book.update_market_data("IBM", FieldMap::new().with_numeric(names::LAST_PX, 50.0));
        book.update_market_data("IBM", FieldMap::new().with_numeric(names::LAST_PX, 51.0));

        let cached = book.market_data("IBM").unwrap();
        assert_eq!(cached.numeric(names::LAST_PX), Some(51.0));
        assert!(book.market_data("MSFT").is_none());
    }

    #[test]
    fn test_orders_for_unknown_instrument_is_empty() {
        let book = TradingBook::new();
        assert!(book.orders_for_instrument("IBM").is_empty());
    }
}
