//! Order operation errors

use crate::lifecycle::TransitionError;
use crate::orders::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("Payment method already set for order {0}")]
    PaymentMethodAlreadySet(String),

    #[error("Payment method required before completing order {0}")]
    MissingPaymentMethod(String),

    #[error("Cannot mark items printed: {0}")]
    PrintPrecondition(String),

    #[error("Channel {channel} is not enabled for vendor {vendor_id}")]
    ChannelDisabled {
        vendor_id: String,
        channel: shared::order::Channel,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type OrderResult<T> = Result<T, OrderError>;
