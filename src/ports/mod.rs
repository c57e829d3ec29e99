//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `MarketplaceClient`: Catalog listing and price/stock writes
//! - `ReferenceFeed`: Supplier stock list loading

pub mod marketplace;
pub mod reference_feed;
