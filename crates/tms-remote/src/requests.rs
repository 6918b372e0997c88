//! Request messages for the remote TMS service.
//!
//! These mirror the service's call surface: unary trading-management calls
//! plus the subscription requests that open each event stream. Order-level
//! calls carry structured messages of named string/numeric fields.

use serde::{Deserialize, Serialize};
use tms_core::{FieldMap, OrderId, TargetId};

/// Login credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user: String,
    pub password: String,
}

/// Market portfolio flavor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioKind {
    /// Plain market portfolio.
    #[default]
    Pure,
}

/// Create a market portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMarketPortfolioRequest {
    pub name: String,
    pub kind: PortfolioKind,
}

impl CreateMarketPortfolioRequest {
    #[must_use]
    pub fn pure(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PortfolioKind::Pure,
        }
    }
}

/// Modify portfolio-level fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyPortfolioRequest {
    pub name: String,
    pub fields: FieldMap,
}

/// Remove a market portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePortfolioRequest {
    pub name: String,
}

/// Add market targets to a portfolio; one field map per target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTargetsRequest {
    pub portfolio: String,
    pub fields: Vec<FieldMap>,
}

/// Modify existing market targets; field maps are applied pairwise, or a
/// single map applies to every target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyTargetsRequest {
    pub target_ids: Vec<TargetId>,
    pub fields: Vec<FieldMap>,
}

/// Plain list of target ids, used by get/remove calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetIds {
    pub target_ids: Vec<TargetId>,
}

/// Pause targets, optionally canceling their open orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseMarketTargetsRequest {
    pub target_ids: Vec<TargetId>,
    pub cancel_open_orders: bool,
}

/// Resume paused targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeMarketTargetsRequest {
    pub target_ids: Vec<TargetId>,
}

/// Terminate targets, optionally canceling their open orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminateMarketTargetsRequest {
    pub target_ids: Vec<TargetId>,
    pub cancel_open_orders: bool,
}

/// Release orders: the next wave for listed targets, and/or explicit
/// non-target order messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendOrdersRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_ids: Vec<TargetId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<FieldMap>,
}

impl SendOrdersRequest {
    /// Request the next wave for the given targets.
    #[must_use]
    pub fn for_targets(target_ids: Vec<TargetId>) -> Self {
        Self {
            target_ids,
            messages: Vec::new(),
        }
    }

    /// Request the next wave for a single target.
    #[must_use]
    pub fn for_target(target_id: TargetId) -> Self {
        Self::for_targets(vec![target_id])
    }
}

/// Modify live orders; field maps are applied pairwise, or a single map
/// applies to every order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyOrdersRequest {
    pub order_ids: Vec<OrderId>,
    pub messages: Vec<FieldMap>,
}

impl ModifyOrdersRequest {
    /// Apply one message to one order.
    #[must_use]
    pub fn single(order_id: OrderId, message: FieldMap) -> Self {
        Self {
            order_ids: vec![order_id],
            messages: vec![message],
        }
    }
}

/// Cancel live orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrdersRequest {
    pub order_ids: Vec<OrderId>,
}

impl CancelOrdersRequest {
    /// Cancel a single order.
    #[must_use]
    pub fn single(order_id: OrderId) -> Self {
        Self {
            order_ids: vec![order_id],
        }
    }
}

/// Post a user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAlertMessageRequest {
    pub users: Vec<String>,
    pub alert_type: String,
    pub description: String,
    pub urgent: bool,
}

impl PostAlertMessageRequest {
    /// Non-urgent informational alert for one user.
    #[must_use]
    pub fn info(user: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            users: vec![user.into()],
            alert_type: "Info".to_string(),
            description: description.into(),
            urgent: false,
        }
    }
}

/// Open the market-targets subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeForTargetsRequest {
    /// Filter expression, e.g. `Portfolio = 'name'`.
    pub filter: String,
    /// Field names populated on delivered events.
    pub fields: Vec<String>,
}

/// Open the orders subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeForOrdersRequest {
    /// Filter expression, e.g. `Portfolio = 'name'`.
    pub filter: String,
    /// Field names populated on delivered events.
    pub fields: Vec<String>,
}

/// Open the market-data subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeForMarketDataRequest {
    /// Instruments to watch.
    pub instruments: Vec<String>,
    /// Field names populated on delivered events.
    pub fields: Vec<String>,
}
