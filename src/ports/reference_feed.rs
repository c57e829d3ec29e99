//! Reference Feed Port - Supplier Stock List Interface
//!
//! Defines the trait for loading the authoritative supplier price and
//! stock list that marketplace listings are synced against.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::ReferenceItem;

/// Failure while loading the supplier list.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
  #[error("feed download timed out: {0}")]
  Timeout(String),
  #[error("feed connection error: {0}")]
  Connection(String),
  #[error("feed HTTP error {status}")]
  Http { status: u16 },
  #[error("failed to read feed file: {0}")]
  Io(String),
  #[error("invalid feed archive: {0}")]
  Archive(String),
  #[error("invalid feed workbook: {0}")]
  Workbook(String),
  #[error("invalid feed table: {0}")]
  Csv(String),
  #[error("feed table has no `{0}` column")]
  MissingColumn(String),
}

/// Trait for supplier data sources.
#[async_trait]
pub trait ReferenceFeed: Send + Sync + 'static {
  /// Load every supplier row as a reference item.
  ///
  /// Rows without a usable price are dropped by the implementor;
  /// rows with a blank identifier are passed through so the
  /// reconciler can reject them.
  async fn load_reference_items(&self) -> Result<Vec<ReferenceItem>, FeedError>;
}
