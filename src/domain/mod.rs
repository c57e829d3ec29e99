//! Domain layer - Core sync logic and models.
//!
//! Pure types and computations for reconciling a marketplace catalog
//! against supplier data. No I/O here (hexagonal architecture inner ring).

pub mod catalog;
pub mod pricing;
pub mod reconcile;
pub mod stock;

// Re-export core types for convenience
pub use catalog::{CatalogItem, Marketplace, OfferId, ReferenceItem, UpdateInstruction};
pub use pricing::{PriceConverter, PriceRounding, parse_supplier_price};
pub use reconcile::{MatchingError, ReconcileOptions, ReconciliationPlan, Reconciler};
pub use stock::{StockPolicy, parse_feed_quantity};
