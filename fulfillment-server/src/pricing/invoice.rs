//! Invoice builder
//!
//! Aggregates canonical line items into the final bill. Exactly one
//! discount may apply; malformed discount values degrade to no discount
//! rather than failing the bill.

use super::reconcile::{to_decimal, to_f64};
use rust_decimal::prelude::*;
use shared::order::{CanonicalLineItem, Discount, Invoice};

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the discount amount against the pre-discount grand total.
///
/// Percentage discounts apply to the grand total (subtotal + GST), not
/// the subtotal. Fixed discounts are rounded first, then clamped so the
/// bill can never go negative.
fn discount_amount(discount: &Discount, grand_pre: Decimal) -> Decimal {
    match discount {
        Discount::Percentage { value } => {
            if !value.is_finite() || *value < 0.0 {
                tracing::warn!(value, "Malformed percentage discount, ignoring");
                return Decimal::ZERO;
            }
            round2(grand_pre * to_decimal(*value) / Decimal::ONE_HUNDRED)
        }
        Discount::Fixed { value } => {
            if !value.is_finite() || *value < 0.0 {
                tracing::warn!(value, "Malformed fixed discount, ignoring");
                return Decimal::ZERO;
            }
            round2(to_decimal(*value)).min(grand_pre)
        }
    }
}

/// Build an invoice from canonical line items and an optional discount.
///
/// The payment method is left unset here; the caller fills it in from
/// the order record.
pub fn build_invoice(items: &[CanonicalLineItem], discount: Option<&Discount>) -> Invoice {
    let subtotal: Decimal = items.iter().map(|i| to_decimal(i.base_subtotal)).sum();
    let gst_total: Decimal = items.iter().map(|i| to_decimal(i.gst_amount)).sum();
    let grand_pre = subtotal + gst_total;

    let discount_amount = discount
        .map(|d| discount_amount(d, grand_pre))
        .unwrap_or(Decimal::ZERO);

    let grand_total = (grand_pre - discount_amount).max(Decimal::ZERO);

    Invoice {
        subtotal: to_f64(subtotal),
        gst_total: to_f64(gst_total),
        discount_amount: to_f64(discount_amount),
        grand_total: to_f64(grand_total),
        payment_method: None,
    }
}
