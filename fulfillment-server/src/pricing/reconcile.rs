//! Canonical line item reconciliation
//!
//! Pure and idempotent: reconciling the output of a previous
//! reconciliation yields the same result. Stored derived fields are only
//! honoured where the algorithm says so; a zero GST rate always forces
//! `gst_amount = 0` and `line_total = base_subtotal`, no matter what
//! stale cached fields claim.

use rust_decimal::prelude::*;
use shared::order::{CanonicalLineItem, CategoryTaxDefault, GstMode, RawLineItem};

/// Rounding for monetary values (2 decimal places, half-away-from-zero)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

#[inline]
fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Keep only finite numeric values
#[inline]
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Normalised item quantity: non-negative integer, defaulting to 1 for
/// missing, non-finite or negative values. Zero is kept as-is and
/// prices the line to zero.
pub fn normalized_quantity(raw: &RawLineItem) -> i64 {
    match finite(raw.quantity) {
        Some(q) if q >= 0.0 => q as i64,
        _ => 1,
    }
}

/// Printed quantity clamped into `[0, quantity]`
pub fn normalized_printed(raw: &RawLineItem, quantity: i64) -> i64 {
    raw.printed_quantity.unwrap_or(0).clamp(0, quantity)
}

/// Reconcile one raw line item into its canonical priced form.
///
/// # Algorithm
///
/// 1. Unit price: first finite value among {price, base_price, unit_price}
/// 2. Base subtotal: explicit `subtotal` if finite, else unit price × qty
/// 3. GST rate: item rate if > 0, else category default, else 0
/// 4. GST mode: exact item mode, else category default, else `exclude`
/// 5. Line total: explicit positive total wins; rate 0 means base
///    subtotal; `include` derives from the taxed unit price; `exclude`
///    adds GST on top of the base subtotal
/// 6. GST amount: fixed by step 5 or `max(0, line_total - base)`; a zero
///    rate forces zero GST regardless of stale stored fields
/// 7. Taxed unit price: `line_total / qty` for `include`, unit price
///    for `exclude`
pub fn reconcile_item(
    raw: &RawLineItem,
    category_default: Option<&CategoryTaxDefault>,
) -> CanonicalLineItem {
    let quantity = normalized_quantity(raw);
    let qty = Decimal::from(quantity);

    // 1. Unit price: first finite candidate
    let unit_price = finite(raw.price)
        .or_else(|| finite(raw.base_price))
        .or_else(|| finite(raw.unit_price))
        .map(to_decimal)
        .unwrap_or(Decimal::ZERO);

    // 2. Base subtotal
    let base_subtotal = match finite(raw.subtotal) {
        Some(s) => round2(to_decimal(s)),
        None => round2(unit_price * qty),
    };

    // 3. GST rate: explicit positive rate, else category fallback
    let gst_rate = match finite(raw.gst_rate) {
        Some(r) if r > 0.0 => to_decimal(r),
        _ => category_default
            .map(|d| to_decimal(d.gst_rate))
            .filter(|r| *r > Decimal::ZERO)
            .unwrap_or(Decimal::ZERO),
    };

    // 4. GST mode: exact item mode, else category fallback, else exclude
    let gst_mode = raw
        .gst_mode
        .as_deref()
        .and_then(GstMode::parse_opt)
        .or_else(|| category_default.map(|d| d.gst_mode))
        .unwrap_or_default();

    // 5. Line total
    let explicit_total = finite(raw.line_total)
        .or_else(|| finite(raw.subtotal_with_gst))
        .filter(|t| *t > 0.0)
        .map(|t| round2(to_decimal(t)));

    let hundred = Decimal::ONE_HUNDRED;
    let mut gst_amount: Option<Decimal> = None;

    let line_total = if gst_rate.is_zero() {
        // A zero rate must never produce tax from stale cached fields
        gst_amount = Some(Decimal::ZERO);
        base_subtotal
    } else if let Some(total) = explicit_total {
        total
    } else {
        match gst_mode {
            GstMode::Include => {
                let taxed_unit = round2(unit_price * (Decimal::ONE + gst_rate / hundred));
                round2(taxed_unit * qty)
            }
            GstMode::Exclude => {
                let gst = round2(base_subtotal * gst_rate / hundred);
                gst_amount = Some(gst);
                base_subtotal + gst
            }
        }
    };

    // 6. GST amount, if not already fixed
    let gst_amount =
        gst_amount.unwrap_or_else(|| round2((line_total - base_subtotal).max(Decimal::ZERO)));

    // 7. Taxed unit price
    let unit_price_with_tax = match gst_mode {
        GstMode::Include => {
            if quantity > 0 {
                round2(line_total / qty)
            } else {
                line_total
            }
        }
        GstMode::Exclude => unit_price,
    };

    let printed_quantity = normalized_printed(raw, quantity);

    CanonicalLineItem {
        item_id: raw.item_id.clone(),
        name: raw.name.clone(),
        quantity,
        unit_price: to_f64(unit_price),
        unit_price_with_tax: to_f64(unit_price_with_tax),
        base_subtotal: to_f64(base_subtotal),
        gst_rate: to_f64(gst_rate),
        gst_mode,
        gst_amount: to_f64(gst_amount),
        line_total: to_f64(line_total),
        printed_quantity,
        unprinted_quantity: quantity - printed_quantity,
        addons: raw.addons.clone().unwrap_or_default(),
    }
}

/// Reconcile a whole item list, resolving the category fallback per item
pub fn reconcile_items<F>(raw_items: &[RawLineItem], mut lookup: F) -> Vec<CanonicalLineItem>
where
    F: FnMut(&str) -> Option<CategoryTaxDefault>,
{
    raw_items
        .iter()
        .map(|raw| {
            let default = raw.category_id.as_deref().and_then(&mut lookup);
            reconcile_item(raw, default.as_ref())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, quantity: f64) -> RawLineItem {
        RawLineItem {
            item_id: "i1".to_string(),
            name: "Paneer Tikka".to_string(),
            price: Some(price),
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    #[test]
    fn test_exclude_mode_scenario() {
        // {price: 100, quantity: 2, gstRate: 5, gstMode: exclude}
        let mut raw = item(100.0, 2.0);
        raw.gst_rate = Some(5.0);
        raw.gst_mode = Some("exclude".to_string());

        let c = reconcile_item(&raw, None);
        assert_eq!(c.base_subtotal, 200.00);
        assert_eq!(c.gst_amount, 10.00);
        assert_eq!(c.line_total, 210.00);
        assert_eq!(c.unit_price_with_tax, 100.00);
    }

    #[test]
    fn test_include_mode_scenario() {
        // {price: 100, quantity: 1, gstRate: 5, gstMode: include}
        let mut raw = item(100.0, 1.0);
        raw.gst_rate = Some(5.0);
        raw.gst_mode = Some("include".to_string());

        let c = reconcile_item(&raw, None);
        assert_eq!(c.unit_price_with_tax, 105.00);
        assert_eq!(c.line_total, 105.00);
        assert_eq!(c.base_subtotal, 100.00);
        assert_eq!(c.gst_amount, 5.00);
    }

    #[test]
    fn test_include_mode_rounds_taxed_unit_before_extending() {
        // round(unitPriceWithTax × quantity) = lineTotal
        let mut raw = item(33.33, 3.0);
        raw.gst_rate = Some(18.0);
        raw.gst_mode = Some("include".to_string());

        let c = reconcile_item(&raw, None);
        // 33.33 * 1.18 = 39.3294 -> 39.33; 39.33 * 3 = 117.99
        assert_eq!(c.line_total, 117.99);
        assert_eq!(c.unit_price_with_tax, 39.33);
        // line_total = base + gst always
        assert_eq!(c.base_subtotal + c.gst_amount, c.line_total);
    }

    #[test]
    fn test_zero_rate_never_trusts_stale_fields() {
        let mut raw = item(50.0, 2.0);
        raw.gst_rate = Some(0.0);
        // Stale cached fields from an old write
        raw.gst_amount = Some(9.0);
        raw.line_total = Some(109.0);

        let c = reconcile_item(&raw, None);
        assert_eq!(c.gst_amount, 0.0);
        assert_eq!(c.line_total, 100.0);
        assert_eq!(c.base_subtotal, 100.0);
    }

    #[test]
    fn test_explicit_positive_line_total_wins() {
        let mut raw = item(100.0, 2.0);
        raw.gst_rate = Some(5.0);
        raw.gst_mode = Some("exclude".to_string());
        raw.line_total = Some(215.5);

        let c = reconcile_item(&raw, None);
        assert_eq!(c.line_total, 215.5);
        assert_eq!(c.gst_amount, 15.5);
    }

    #[test]
    fn test_unit_price_candidate_precedence() {
        let raw = RawLineItem {
            base_price: Some(80.0),
            unit_price: Some(70.0),
            quantity: Some(1.0),
            ..Default::default()
        };
        let c = reconcile_item(&raw, None);
        assert_eq!(c.unit_price, 80.0);

        let raw = RawLineItem {
            price: Some(f64::NAN),
            base_price: Some(80.0),
            quantity: Some(1.0),
            ..Default::default()
        };
        // NaN is skipped, not treated as present
        let c = reconcile_item(&raw, None);
        assert_eq!(c.unit_price, 80.0);
    }

    #[test]
    fn test_missing_price_defaults_to_zero() {
        let raw = RawLineItem {
            quantity: Some(2.0),
            ..Default::default()
        };
        let c = reconcile_item(&raw, None);
        assert_eq!(c.unit_price, 0.0);
        assert_eq!(c.line_total, 0.0);
    }

    #[test]
    fn test_quantity_defaults() {
        for bad in [Some(-3.0), Some(f64::NAN), Some(f64::INFINITY), None] {
            let mut raw = item(10.0, 1.0);
            raw.quantity = bad;
            let c = reconcile_item(&raw, None);
            assert_eq!(c.quantity, 1, "quantity {:?} should default to 1", bad);
        }
    }

    #[test]
    fn test_zero_quantity_prices_to_zero() {
        let mut raw = item(100.0, 0.0);
        raw.gst_rate = Some(5.0);
        raw.gst_mode = Some("exclude".to_string());
        let c = reconcile_item(&raw, None);
        assert_eq!(c.quantity, 0);
        assert_eq!(c.base_subtotal, 0.0);
        assert_eq!(c.gst_amount, 0.0);
        assert_eq!(c.line_total, 0.0);
        assert_eq!(c.printed_quantity + c.unprinted_quantity, 0);

        // Include mode cannot divide by quantity; the taxed unit price
        // falls back to the line total
        raw.gst_mode = Some("include".to_string());
        let c = reconcile_item(&raw, None);
        assert_eq!(c.line_total, 0.0);
        assert_eq!(c.unit_price_with_tax, 0.0);
    }

    #[test]
    fn test_category_fallback_for_rate_and_mode() {
        let mut raw = item(100.0, 1.0);
        raw.category_id = Some("cat-1".to_string());
        let default = CategoryTaxDefault {
            category_id: "cat-1".to_string(),
            gst_rate: 12.0,
            gst_mode: GstMode::Include,
        };

        let c = reconcile_item(&raw, Some(&default));
        assert_eq!(c.gst_rate, 12.0);
        assert_eq!(c.gst_mode, GstMode::Include);
        assert_eq!(c.line_total, 112.0);
    }

    #[test]
    fn test_explicit_rate_beats_category_default() {
        let mut raw = item(100.0, 1.0);
        raw.gst_rate = Some(5.0);
        raw.gst_mode = Some("exclude".to_string());
        let default = CategoryTaxDefault {
            category_id: "cat-1".to_string(),
            gst_rate: 18.0,
            gst_mode: GstMode::Include,
        };

        let c = reconcile_item(&raw, Some(&default));
        assert_eq!(c.gst_rate, 5.0);
        assert_eq!(c.gst_mode, GstMode::Exclude);
    }

    #[test]
    fn test_unrecognised_mode_string_falls_through() {
        let mut raw = item(100.0, 1.0);
        raw.gst_rate = Some(10.0);
        raw.gst_mode = Some("INCLUSIVE".to_string());

        // No category default: falls all the way to exclude
        let c = reconcile_item(&raw, None);
        assert_eq!(c.gst_mode, GstMode::Exclude);
        assert_eq!(c.line_total, 110.0);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let mut raw = item(100.0, 2.0);
        raw.gst_rate = Some(5.0);
        raw.gst_mode = Some("exclude".to_string());

        let first = reconcile_item(&raw, None);

        // Feed the canonical result back in as if it had been stored
        let round_trip = RawLineItem {
            item_id: first.item_id.clone(),
            name: first.name.clone(),
            quantity: Some(first.quantity as f64),
            price: Some(first.unit_price),
            subtotal: Some(first.base_subtotal),
            line_total: Some(first.line_total),
            gst_amount: Some(first.gst_amount),
            gst_rate: Some(first.gst_rate),
            gst_mode: Some("exclude".to_string()),
            ..Default::default()
        };
        let second = reconcile_item(&round_trip, None);
        assert_eq!(second, first);
    }

    #[test]
    fn test_print_counts_carried_and_clamped() {
        let mut raw = item(10.0, 3.0);
        raw.printed_quantity = Some(2);
        let c = reconcile_item(&raw, None);
        assert_eq!(c.printed_quantity, 2);
        assert_eq!(c.unprinted_quantity, 1);

        // Over-count clamps to quantity
        raw.printed_quantity = Some(99);
        let c = reconcile_item(&raw, None);
        assert_eq!(c.printed_quantity, 3);
        assert_eq!(c.unprinted_quantity, 0);
        assert_eq!(c.printed_quantity + c.unprinted_quantity, c.quantity);
    }

    #[test]
    fn test_reconcile_items_resolves_per_category() {
        let mut a = item(100.0, 1.0);
        a.category_id = Some("cat-1".to_string());
        let b = item(50.0, 1.0);

        let canon = reconcile_items(&[a, b], |cat| {
            (cat == "cat-1").then(|| CategoryTaxDefault {
                category_id: "cat-1".to_string(),
                gst_rate: 5.0,
                gst_mode: GstMode::Exclude,
            })
        });
        assert_eq!(canon[0].gst_amount, 5.0);
        assert_eq!(canon[1].gst_amount, 0.0);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 0.005 rounds up to 0.01
        let mut raw = item(0.25, 1.0);
        raw.gst_rate = Some(2.0);
        raw.gst_mode = Some("exclude".to_string());
        let c = reconcile_item(&raw, None);
        // 0.25 * 0.02 = 0.005 -> 0.01
        assert_eq!(c.gst_amount, 0.01);
        assert_eq!(c.line_total, 0.26);
    }
}
