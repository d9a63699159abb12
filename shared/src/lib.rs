//! Shared types for the fulfillment platform
//!
//! Common types used by the fulfillment server and its clients:
//! channels, order status vocabulary, line items, invoices, kitchen
//! tickets and lifecycle events.

pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use order::{Channel, LifecycleEvent, OrderStatus, PaymentMethod};
