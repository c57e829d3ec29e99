//! Stock quantity normalization.
//!
//! The supplier list reports quantities as text. Two markers need
//! special handling: `">10"` means "plenty" and `"1"` is the last
//! showcase unit, which is not offered for sale.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Quantity published for `">N"` rows.
pub const OVERFLOW_STOCK: i64 = 100;

/// A lone unit is the display sample and is never sold.
const SHOWCASE_UNIT: i64 = 1;

/// Parse a supplier quantity cell.
///
/// Returns `None` when the cell is not a quantity at all.
pub fn parse_feed_quantity(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.starts_with('>') {
        return Some(OVERFLOW_STOCK);
    }
    let count = match raw.parse::<i64>() {
        Ok(n) => n,
        // Spreadsheet exports sometimes write counts as "5.0" / "5,0".
        Err(_) => Decimal::from_str(&raw.replace(',', "."))
            .ok()
            .and_then(|d| d.trunc().to_i64())?,
    };
    Some(if count == SHOWCASE_UNIT { 0 } else { count })
}

/// Marketplace-side stock limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockPolicy {
    /// Largest quantity the marketplace accepts, if it enforces one.
    max_quantity: Option<u32>,
}

impl StockPolicy {
    /// Create a policy with an optional upper bound.
    pub fn new(max_quantity: Option<u32>) -> Self {
        Self { max_quantity }
    }

    /// Clamp a supplier quantity into `[0, max_quantity]`.
    pub fn to_marketplace(&self, supplier_stock: i64) -> u32 {
        let upper = self.max_quantity.unwrap_or(u32::MAX);
        supplier_stock.clamp(0, i64::from(upper)) as u32
    }
}
