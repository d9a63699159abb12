//! Fulfillment channels and the per-channel status vocabulary

use serde::{Deserialize, Serialize};

/// Fulfillment channel - fixed at order creation, never re-inferred
/// from incidental fields afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    /// Table-based dine-in service
    Dining,
    /// Address-based delivery
    Delivery,
    /// Reference-code-based pickup
    Pickup,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Dining => write!(f, "DINING"),
            Channel::Delivery => write!(f, "DELIVERY"),
            Channel::Pickup => write!(f, "PICKUP"),
        }
    }
}

/// Channel-specific reference carried by an order.
///
/// An explicit tagged union: the variant is chosen once at checkout and
/// must agree with the order's channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelRef {
    /// Dine-in: the occupied table
    Table { table_id: String },
    /// Delivery: the customer's stored address
    DeliveryAddress { address_id: String },
    /// Pickup: customer-facing reference code
    Pickup { reference: String },
}

impl ChannelRef {
    /// Whether this reference is valid for the given channel
    pub fn matches_channel(&self, channel: Channel) -> bool {
        matches!(
            (self, channel),
            (ChannelRef::Table { .. }, Channel::Dining)
                | (ChannelRef::DeliveryAddress { .. }, Channel::Delivery)
                | (ChannelRef::Pickup { .. }, Channel::Pickup)
        )
    }

    /// Table id, if this is a dine-in reference
    pub fn table_id(&self) -> Option<&str> {
        match self {
            ChannelRef::Table { table_id } => Some(table_id),
            _ => None,
        }
    }
}

/// Order status vocabulary across all channels.
///
/// Which statuses are reachable, and in which sequence, is channel-scoped;
/// the flow tables live in the server's lifecycle module.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Completed,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Accepted => write!(f, "ACCEPTED"),
            OrderStatus::Preparing => write!(f, "PREPARING"),
            OrderStatus::Ready => write!(f, "READY"),
            OrderStatus::OutForDelivery => write!(f, "OUT_FOR_DELIVERY"),
            OrderStatus::Delivered => write!(f, "DELIVERED"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Recorded payment method. Recorded, not settled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Upi,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "CASH"),
            PaymentMethod::Upi => write!(f, "UPI"),
        }
    }
}

/// Per-status timestamps (Unix milliseconds), filled in as the order
/// advances through its flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusTimestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparing_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_for_delivery_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl StatusTimestamps {
    /// Record the timestamp for a newly reached status.
    ///
    /// `Pending` has no timestamp of its own (it is the creation time).
    pub fn record(&mut self, status: OrderStatus, timestamp: i64) {
        match status {
            OrderStatus::Pending => {}
            OrderStatus::Accepted => self.accepted_at = Some(timestamp),
            OrderStatus::Preparing => self.preparing_at = Some(timestamp),
            OrderStatus::Ready => self.ready_at = Some(timestamp),
            OrderStatus::OutForDelivery => self.out_for_delivery_at = Some(timestamp),
            OrderStatus::Delivered => self.delivered_at = Some(timestamp),
            OrderStatus::Completed => self.completed_at = Some(timestamp),
        }
    }
}
