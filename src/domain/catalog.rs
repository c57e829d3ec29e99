//! Catalog domain types.
//!
//! Snapshots exchanged between the marketplace, the supplier feed and
//! the reconciler. Everything here lives for exactly one sync run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Type aliases consumed by ports and adapters
// ────────────────────────────────────────────

/// Seller-side article used as the join key (Ozon `offer_id`,
/// Yandex.Market `shopSku`, supplier `Код`).
pub type OfferId = String;

/// Supported marketplaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marketplace {
    /// Ozon.ru Seller API.
    Ozon,
    /// Yandex.Market Partner API.
    YandexMarket,
}

impl std::fmt::Display for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ozon => write!(f, "ozon"),
            Self::YandexMarket => write!(f, "yandex_market"),
        }
    }
}

/// An offer as currently listed on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Seller article.
    pub offer_id: OfferId,
    /// Current listed price, when the listing endpoint reports it.
    pub price: Option<Decimal>,
    /// Current stock, when the listing endpoint reports it.
    pub stock: Option<u32>,
}

impl CatalogItem {
    /// Catalog entry with no known price or stock.
    pub fn listed(offer_id: impl Into<OfferId>) -> Self {
        Self {
            offer_id: offer_id.into(),
            price: None,
            stock: None,
        }
    }
}

/// A row of the supplier stock list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceItem {
    /// Supplier article, matched against [`CatalogItem::offer_id`].
    pub offer_id: OfferId,
    /// Supplier price in rubles, before marketplace rounding.
    pub price: Decimal,
    /// Supplier quantity after feed normalization. May be out of range;
    /// the reconciler clamps it.
    pub stock: i64,
}

/// A single price/stock write for one offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInstruction {
    /// Target offer.
    pub offer_id: OfferId,
    /// New marketplace price. `None` means a stock-only write
    /// (an offer the supplier no longer lists).
    pub price: Option<Decimal>,
    /// New marketplace stock.
    pub stock: u32,
}

impl UpdateInstruction {
    /// Whether this instruction carries a price write.
    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }
}
