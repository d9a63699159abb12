//! Lifecycle events - ephemeral broadcast notifications
//!
//! Events carry only the identifiers a subscriber needs to decide whether
//! to refetch. They are never persisted; delivery is best-effort and every
//! subscriber re-synchronises on a fixed interval regardless of receipt.

use super::channel::{Channel, OrderStatus};
use serde::{Deserialize, Serialize};

/// A lifecycle change worth telling observers about
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleEvent {
    OrderCreated {
        order_id: String,
        vendor_id: String,
        channel: Channel,
    },
    OrderStatusChanged {
        order_id: String,
        vendor_id: String,
        channel: Channel,
        from: OrderStatus,
        to: OrderStatus,
    },
    /// Something about the order changed that is not a status transition
    /// (payment method set, print ledger updated)
    OrderUpdated {
        order_id: String,
        vendor_id: String,
    },
    KotCreated {
        order_id: String,
        vendor_id: String,
        ticket_number: String,
    },
    TableStatusChanged {
        vendor_id: String,
        table_id: String,
        occupied: bool,
    },
}

impl LifecycleEvent {
    /// Vendor scope of this event
    pub fn vendor_id(&self) -> &str {
        match self {
            LifecycleEvent::OrderCreated { vendor_id, .. }
            | LifecycleEvent::OrderStatusChanged { vendor_id, .. }
            | LifecycleEvent::OrderUpdated { vendor_id, .. }
            | LifecycleEvent::KotCreated { vendor_id, .. }
            | LifecycleEvent::TableStatusChanged { vendor_id, .. } => vendor_id,
        }
    }

    /// Order this event refers to, if any
    pub fn order_id(&self) -> Option<&str> {
        match self {
            LifecycleEvent::OrderCreated { order_id, .. }
            | LifecycleEvent::OrderStatusChanged { order_id, .. }
            | LifecycleEvent::OrderUpdated { order_id, .. }
            | LifecycleEvent::KotCreated { order_id, .. } => Some(order_id),
            LifecycleEvent::TableStatusChanged { .. } => None,
        }
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::OrderCreated { .. } => write!(f, "ORDER_CREATED"),
            LifecycleEvent::OrderStatusChanged { .. } => write!(f, "ORDER_STATUS_CHANGED"),
            LifecycleEvent::OrderUpdated { .. } => write!(f, "ORDER_UPDATED"),
            LifecycleEvent::KotCreated { .. } => write!(f, "KOT_CREATED"),
            LifecycleEvent::TableStatusChanged { .. } => write!(f, "TABLE_STATUS_CHANGED"),
        }
    }
}
