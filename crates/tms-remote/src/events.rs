//! Typed events delivered on streaming subscriptions.
//!
//! Each subscription yields one union of domain cases plus a feed-status
//! case signaling connection lifecycle. Handlers match exhaustively; there
//! is no stringly-typed discriminant dispatch.

use serde::{Deserialize, Serialize};
use tms_core::{FieldMap, OrderId, TargetId};

/// Connection-lifecycle signal on a subscription, distinct from domain
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedStatus {
    /// Feed lost its upstream connection; state may be stale.
    Disconnected,
    /// Feed reconnected; updates resume.
    Reconnected,
    /// The initial-state replay is complete; subsequent events are live.
    InitialStateReceived,
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Reconnected => write!(f, "reconnected"),
            Self::InitialStateReceived => write!(f, "initial state received"),
        }
    }
}

/// Events on the market-targets subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetEvent {
    Added {
        target_id: TargetId,
        fields: FieldMap,
    },
    Updated {
        target_id: TargetId,
        fields: FieldMap,
    },
    Removed {
        target_id: TargetId,
    },
    FilteredOut {
        target_id: TargetId,
    },
    Paused {
        target_id: TargetId,
    },
    Resumed {
        target_id: TargetId,
    },
    Terminated {
        target_id: TargetId,
    },
    Feed(FeedStatus),
}

/// Events on the orders subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderEvent {
    Added { order_id: OrderId, fields: FieldMap },
    Updated { order_id: OrderId, fields: FieldMap },
    Removed { order_id: OrderId },
    Feed(FeedStatus),
}

/// Events on the market-data subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarketDataEvent {
    Update { instrument: String, fields: FieldMap },
    Feed(FeedStatus),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_core::fields::names;

    #[test]
    fn test_feed_status_display() {
        assert_eq!(FeedStatus::Disconnected.to_string(), "disconnected");
        assert_eq!(
            FeedStatus::InitialStateReceived.to_string(),
            "initial state received"
        );
    }

    #[test]
    fn test_target_event_serde_round_trip() {
        let event = TargetEvent::Updated {
            target_id: TargetId::new(7),
            fields: FieldMap::new().with_numeric(names::UNRELEASED, 500.0),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: TargetEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_order_event_serde_round_trip() {
        let event = OrderEvent::Added {
            order_id: OrderId::new("ord-1"),
            fields: FieldMap::new().with_numeric(names::LEAVES, 100.0),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: OrderEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
