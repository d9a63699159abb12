//! Order Fulfillment Module
//!
//! Types for the order fulfillment and billing pipeline:
//! - Channels: explicit fulfillment path, fixed at order creation
//! - Raw line items: authoritative stored data, possibly partial
//! - Canonical line items: tax-correct pricing derived fresh on every read
//! - Lifecycle events: ephemeral broadcast notifications

pub mod channel;
pub mod event;
pub mod types;

// Re-exports
pub use channel::{Channel, ChannelRef, OrderStatus, PaymentMethod, StatusTimestamps};
pub use event::LifecycleEvent;
pub use types::*;
