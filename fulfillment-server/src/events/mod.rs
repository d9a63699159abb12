//! Event fan-out and resynchronisation
//!
//! Delivery is at-least-once, unordered, fire-and-forget. An event only
//! tells a subscriber that something changed; the refetch that follows
//! is what carries truth. [`resync::spawn_resync`] runs that refetch on
//! a fixed interval whether or not any event arrived, so dropped or
//! lagged events cost staleness for at most one interval.

pub mod broadcaster;
pub mod resync;

pub use broadcaster::{EventBroadcaster, Subscription};
pub use resync::spawn_resync;
