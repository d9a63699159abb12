//! Catalog and vendor context
//!
//! Trait seams for the data the order engine consults but does not own:
//! category tax defaults from the menu catalog, per-vendor channel
//! enablement, and dining table occupancy. In-memory DashMap-backed
//! implementations serve a single-node deployment; a remote-backed
//! implementation would plug into the same traits.

use dashmap::DashMap;
use shared::order::{CategoryTaxDefault, Channel};

/// Category-level tax fallback lookup
pub trait TaxDefaultSource: Send + Sync {
    fn tax_default(&self, category_id: &str) -> Option<CategoryTaxDefault>;
}

/// Per-vendor fulfillment channel configuration
pub trait VendorProfileStore: Send + Sync {
    fn is_channel_enabled(&self, vendor_id: &str, channel: Channel) -> bool;
}

/// Dining table occupancy
pub trait TableStore: Send + Sync {
    fn occupy_table(&self, vendor_id: &str, table_id: &str);
    fn release_table(&self, vendor_id: &str, table_id: &str);
    fn is_occupied(&self, vendor_id: &str, table_id: &str) -> bool;
}

/// In-memory category tax defaults, keyed by category id
#[derive(Default)]
pub struct InMemoryCatalog {
    defaults: DashMap<String, CategoryTaxDefault>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default(&self, default: CategoryTaxDefault) {
        self.defaults.insert(default.category_id.clone(), default);
    }
}

impl TaxDefaultSource for InMemoryCatalog {
    fn tax_default(&self, category_id: &str) -> Option<CategoryTaxDefault> {
        self.defaults.get(category_id).map(|d| d.clone())
    }
}

/// In-memory vendor channel configuration.
///
/// Channels are enabled by default; only explicit disables are stored, so
/// an unknown vendor accepts orders on every channel.
#[derive(Default)]
pub struct InMemoryVendorProfiles {
    disabled: DashMap<(String, Channel), ()>,
}

impl InMemoryVendorProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable_channel(&self, vendor_id: &str, channel: Channel) {
        self.disabled.insert((vendor_id.to_string(), channel), ());
    }

    pub fn enable_channel(&self, vendor_id: &str, channel: Channel) {
        self.disabled.remove(&(vendor_id.to_string(), channel));
    }
}

impl VendorProfileStore for InMemoryVendorProfiles {
    fn is_channel_enabled(&self, vendor_id: &str, channel: Channel) -> bool {
        !self.disabled.contains_key(&(vendor_id.to_string(), channel))
    }
}

/// In-memory table occupancy, keyed by (vendor, table)
#[derive(Default)]
pub struct InMemoryTableStore {
    occupied: DashMap<(String, String), ()>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableStore for InMemoryTableStore {
    fn occupy_table(&self, vendor_id: &str, table_id: &str) {
        self.occupied
            .insert((vendor_id.to_string(), table_id.to_string()), ());
    }

    fn release_table(&self, vendor_id: &str, table_id: &str) {
        self.occupied
            .remove(&(vendor_id.to_string(), table_id.to_string()));
    }

    fn is_occupied(&self, vendor_id: &str, table_id: &str) -> bool {
        self.occupied
            .contains_key(&(vendor_id.to_string(), table_id.to_string()))
    }
}
