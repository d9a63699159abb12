//! Order, line item, invoice and kitchen ticket types
//!
//! `RawLineItem` is the authoritative stored form of a line: partial,
//! duck-typed, never trusted for pricing. `CanonicalLineItem` is the
//! tax-correct derived form, recomputed from raw data on every read.

use super::channel::{Channel, ChannelRef, OrderStatus, PaymentMethod, StatusTimestamps};
use serde::{Deserialize, Serialize};

/// GST application mode for a line item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GstMode {
    /// Tax already included in the displayed unit price
    Include,
    /// Tax added on top of the base subtotal
    #[default]
    Exclude,
}

impl GstMode {
    /// Parse an ad-hoc mode string. Only the exact values `include` and
    /// `exclude` are recognised; anything else is treated as unset.
    pub fn parse_opt(raw: &str) -> Option<GstMode> {
        match raw {
            "include" => Some(GstMode::Include),
            "exclude" => Some(GstMode::Exclude),
            _ => None,
        }
    }
}

/// Addon selected on a line item. Carried through to the canonical item
/// and the kitchen ticket for display; pricing comes from the item's own
/// price fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddonSelection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Raw stored line item - authoritative source data, possibly partial.
///
/// Every numeric field is optional and lenient: historical orders carry
/// whichever subset of fields the client of the day happened to send.
/// Stale derived fields (`gst_amount`, `line_total`) may be present and
/// must never be trusted when `gst_rate` is zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawLineItem {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub name: String,
    /// Positive integer in well-formed data; lenient here, clamped during
    /// reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,

    // === Unit price candidates, in precedence order ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,

    // === Optional stored derived fields ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal_with_gst: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_amount: Option<f64>,

    // === Tax fields ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_rate: Option<f64>,
    /// Free-form mode string; only exact `include`/`exclude` are honoured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addons: Option<Vec<AddonSelection>>,

    // === Print-tracking annotation ===
    /// The only field mutated after the order reaches a terminal status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printed_quantity: Option<i64>,
}

impl RawLineItem {
    /// Parse a serialized item list leniently.
    ///
    /// Unparseable payloads degrade to an empty list so that display and
    /// billing stay available for corrupted historical orders.
    pub fn parse_list(payload: &str) -> Vec<RawLineItem> {
        match serde_json::from_str::<Vec<RawLineItem>>(payload) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable line item payload, treating as empty");
                Vec::new()
            }
        }
    }

    /// Serialize an item list back to the stored form
    pub fn serialize_list(items: &[RawLineItem]) -> String {
        serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Category-level tax fallback, owned by the menu catalog.
/// Consulted only when a line item omits its own tax fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTaxDefault {
    pub category_id: String,
    pub gst_rate: f64,
    pub gst_mode: GstMode,
}

/// Canonical line item - derived, never persisted as ground truth.
///
/// Invariants: `quantity = printed_quantity + unprinted_quantity` and
/// `line_total = base_subtotal + gst_amount`, regardless of GST mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalLineItem {
    pub item_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub unit_price_with_tax: f64,
    pub base_subtotal: f64,
    pub gst_rate: f64,
    pub gst_mode: GstMode,
    pub gst_amount: f64,
    pub line_total: f64,
    pub printed_quantity: i64,
    pub unprinted_quantity: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addons: Vec<AddonSelection>,
}

/// Customer identity captured at checkout
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// An order across any fulfillment channel.
///
/// Mutated only through status transitions, the one-time payment-method
/// set, and print-tracking annotations. Line items are kept in their raw
/// serialized form and parsed leniently on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub vendor_id: String,
    pub channel: Channel,
    pub status: OrderStatus,
    /// Raw serialized line items, exactly as received at checkout
    pub items_payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub customer: CustomerInfo,
    pub channel_ref: ChannelRef,
    #[serde(default)]
    pub timestamps: StatusTimestamps,
    /// Unix milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Parse the stored item payload leniently (empty list on corruption)
    pub fn raw_items(&self) -> Vec<RawLineItem> {
        RawLineItem::parse_list(&self.items_payload)
    }

    /// Replace the stored item payload
    pub fn set_raw_items(&mut self, items: &[RawLineItem]) {
        self.items_payload = RawLineItem::serialize_list(items);
    }
}

/// Discount specification - one active at a time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Discount {
    /// Percentage of the pre-discount grand total
    Percentage { value: f64 },
    /// Fixed amount, clamped so it can never exceed the bill
    Fixed { value: f64 },
}

/// Final computed invoice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub subtotal: f64,
    pub gst_total: f64,
    pub discount_amount: f64,
    pub grand_total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

/// Kitchen ticket status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Printed,
    Reprinted,
}

/// Kitchen Order Ticket - created once per order on the first successful
/// print; all later prints reuse it and only update the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KitchenTicket {
    pub order_id: String,
    /// Unique, server-generated (crash-safe counter)
    pub ticket_number: String,
    pub status: TicketStatus,
    pub created_at: i64,
    pub printed_at: i64,
    pub print_count: u32,
    /// Item snapshot taken at first-print time
    pub items: Vec<CanonicalLineItem>,
}

/// One entry of a mark-printed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrintEntry {
    pub item_id: String,
    pub quantity: i64,
}
