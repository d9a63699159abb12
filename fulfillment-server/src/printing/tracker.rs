//! Print ledger mutation
//!
//! The printed count is the only field ever mutated on a stored line
//! item after checkout. Requests are clamped per item so that printed
//! never exceeds the item quantity; replaying the same request is a
//! no-op once everything is printed.

use crate::pricing::reconcile::{normalized_printed, normalized_quantity};
use shared::order::{PrintEntry, RawLineItem};

/// Apply a batch of mark-printed entries to the stored items.
///
/// Unknown item ids and non-positive quantities are ignored. Returns the
/// total number of units newly marked printed.
pub fn apply_print_entries(items: &mut [RawLineItem], entries: &[PrintEntry]) -> i64 {
    let mut marked = 0;
    for entry in entries {
        if entry.quantity <= 0 {
            continue;
        }
        let Some(item) = items.iter_mut().find(|i| i.item_id == entry.item_id) else {
            tracing::warn!(item_id = %entry.item_id, "Mark-printed entry for unknown item, skipping");
            continue;
        };
        let quantity = normalized_quantity(item);
        let printed = normalized_printed(item, quantity);
        let unprinted = quantity - printed;
        let delta = entry.quantity.min(unprinted);
        if delta > 0 {
            item.printed_quantity = Some(printed + delta);
            marked += delta;
        }
    }
    marked
}
