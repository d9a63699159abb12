//! Order management
//!
//! `OrdersManager` is the single operation surface over orders: creation,
//! lifecycle transitions, payment method capture, print tracking and
//! billing. Every mutation is one redb write transaction; events publish
//! only after the commit succeeds.

pub mod error;
pub mod manager;
pub mod storage;

pub use error::{OrderError, OrderResult};
pub use manager::{NewOrder, OrdersManager};
pub use storage::{OrderStorage, StorageError};
