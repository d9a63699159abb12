//! Pricing Reconciliation Engine and Invoice Builder
//!
//! Raw stored line items are partial and duck-typed; nothing derived in
//! them is trusted. [`reconcile::reconcile_item`] turns one raw item plus
//! an optional category tax fallback into exactly one canonical,
//! tax-correct line item, and [`invoice::build_invoice`] aggregates
//! canonical items into a final bill.
//!
//! All money math uses `rust_decimal` internally and converts back to
//! `f64` for storage/serialization, rounded to 2 decimal places
//! half-away-from-zero.

pub mod invoice;
pub mod reconcile;

pub use invoice::build_invoice;
pub use reconcile::{reconcile_item, reconcile_items};
