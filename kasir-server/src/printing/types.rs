//! Receipt printing types
//!
//! Read-only snapshots consumed by the print pipeline. The pipeline
//! borrows this data and never mutates it; ownership stays with the
//! storage layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display name used when an item has neither a catalog nor a manual name
pub const FALLBACK_ITEM_NAME: &str = "Produk";

/// Store name printed when the operator has not configured one
pub const FALLBACK_STORE_NAME: &str = "KasirQu";

/// Address line printed when the operator has not configured one
pub const FALLBACK_STORE_ADDRESS: &str = "Jl. Contoh No. 1";

/// Upper bound on copies per print request
pub const MAX_COPIES: u32 = 10;

/// A completed transaction, as printed.
///
/// All amounts are whole rupiah.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    pub id: u64,
    pub total: i64,
    pub paid: i64,
    /// paid - total, computed at checkout
    pub change: i64,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    pub items: Vec<LineItem>,
}

/// One row of a transaction: a catalog product or a manual entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Resolved catalog product name
    #[serde(default)]
    pub product_name: Option<String>,
    /// Free-text name for ad hoc charges
    #[serde(default)]
    pub manual_name: Option<String>,
    pub quantity: i64,
    /// unit price x quantity, computed at checkout
    pub subtotal: i64,
}

impl LineItem {
    /// Display name: manual entry wins over the catalog name.
    pub fn display_name(&self) -> &str {
        non_blank(self.manual_name.as_deref())
            .or_else(|| non_blank(self.product_name.as_deref()))
            .unwrap_or(FALLBACK_ITEM_NAME)
    }

    /// Unit price for display only; integer division is acceptable here
    /// since pricing was settled at checkout.
    pub fn unit_price(&self) -> i64 {
        if self.quantity > 0 {
            self.subtotal / self.quantity
        } else {
            self.subtotal
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Typed view over the raw settings key-value map.
///
/// Loaded once per print request and reused across copies.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptSettings {
    pub store_name: String,
    pub store_address: String,
    /// Empty string when not configured; the phone line is skipped then
    pub store_phone: String,
    /// Raw multi-line text; blank lines are filtered at render time
    pub receipt_header: String,
    pub receipt_footer: String,
    pub print_copies: u32,
    pub auto_print: bool,
}

impl ReceiptSettings {
    /// Build the typed view from raw settings rows.
    ///
    /// Key aliases from older installs are honored
    /// (`store.name`, `address`, `phone`).
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        Self {
            store_name: lookup(map, &["storeName", "store.name"])
                .unwrap_or_else(|| FALLBACK_STORE_NAME.to_string()),
            store_address: lookup(map, &["storeAddress", "address"])
                .unwrap_or_else(|| FALLBACK_STORE_ADDRESS.to_string()),
            store_phone: lookup(map, &["storePhone", "phone"]).unwrap_or_default(),
            receipt_header: map.get("receiptHeader").cloned().unwrap_or_default(),
            receipt_footer: map.get("receiptFooter").cloned().unwrap_or_default(),
            print_copies: clamp_copies(
                map.get("printCopies")
                    .and_then(|s| s.trim().parse::<i64>().ok())
                    .unwrap_or(1),
            ),
            auto_print: map.get("autoPrint").map(|s| truthy(s)).unwrap_or(false),
        }
    }
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

fn lookup(map: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| map.get(*k))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn truthy(s: &str) -> bool {
    let s = s.trim();
    s == "1" || s.eq_ignore_ascii_case("true")
}

/// Clamp a requested copy count into the supported range.
pub fn clamp_copies(n: i64) -> u32 {
    n.clamp(1, MAX_COPIES as i64) as u32
}

/// Read-only transaction access used by the print pipeline.
pub trait TransactionSource: Send + Sync {
    fn transaction(&self, id: u64) -> anyhow::Result<Option<TransactionSnapshot>>;
}

/// Read-only settings access used by the print pipeline.
pub trait SettingsLookup: Send + Sync {
    fn settings_map(&self) -> anyhow::Result<HashMap<String, String>>;
}
