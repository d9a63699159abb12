//! Channel-aware order lifecycle state machine
//!
//! Every fulfillment channel has a fixed linear status flow. Transitions
//! only ever move one step forward; skipping is rejected and advancing a
//! terminal order is a no-op. The flow itself lives here as pure data so
//! it can be validated without touching storage.

use shared::order::{Channel, OrderStatus};
use thiserror::Error;

use OrderStatus::*;

const DINING_FLOW: &[OrderStatus] = &[Pending, Accepted, Preparing, Ready, Delivered, Completed];
const DELIVERY_FLOW: &[OrderStatus] =
    &[Pending, Accepted, Preparing, Ready, OutForDelivery, Delivered];
const PICKUP_FLOW: &[OrderStatus] = &[Pending, Accepted, Preparing, Ready, Completed];

/// Transition rejected by the state machine
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid transition {from} -> {to} for channel {channel}")]
pub struct TransitionError {
    pub channel: Channel,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// The ordered status flow for a channel
pub fn flow(channel: Channel) -> &'static [OrderStatus] {
    match channel {
        Channel::Dining => DINING_FLOW,
        Channel::Delivery => DELIVERY_FLOW,
        Channel::Pickup => PICKUP_FLOW,
    }
}

/// Whether a status is the terminal state of its channel's flow
pub fn is_terminal(channel: Channel, status: OrderStatus) -> bool {
    flow(channel).last() == Some(&status)
}

/// The next status in the flow, or the current one if already terminal
pub fn next(channel: Channel, current: OrderStatus) -> OrderStatus {
    let flow = flow(channel);
    flow.iter()
        .position(|s| *s == current)
        .and_then(|i| flow.get(i + 1))
        .copied()
        .unwrap_or(current)
}

/// Validate a transition to an explicit target status.
///
/// Accepted only when the target is the immediate successor of the
/// current status in this channel's flow. `Ok(from)` signals a terminal
/// no-op when the target equals a terminal current status.
pub fn advance_to(
    channel: Channel,
    from: OrderStatus,
    target: OrderStatus,
) -> Result<OrderStatus, TransitionError> {
    if is_terminal(channel, from) && target == from {
        return Ok(from);
    }
    let flow = flow(channel);
    let from_idx = flow.iter().position(|s| *s == from);
    let target_idx = flow.iter().position(|s| *s == target);
    match (from_idx, target_idx) {
        (Some(f), Some(t)) if t == f + 1 => Ok(target),
        _ => Err(TransitionError { channel, from, to: target }),
    }
}
