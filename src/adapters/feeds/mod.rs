//! Supplier Feed Adapters - Reference Price/Stock Sources
//!
//! Provides the supplier stock list as reference items:
//! - Supplier: zipped CSV stock list download and parsing
//! - Memo: shares one download across all marketplace targets

pub mod memo;
pub mod supplier;

pub use memo::MemoizedFeed;
pub use supplier::{FeedColumns, FeedSource, SupplierFeed};
