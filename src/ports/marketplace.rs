//! Marketplace Port - Seller Catalog Interface
//!
//! Defines the trait for listing a seller's offers and writing price
//! and stock updates back to a marketplace (Ozon, Yandex.Market).
//!
//! Key design decisions:
//! - Writes are batched; batch sizes come from the marketplace limits
//! - Per-item rejections are reported, not raised
//! - Transport failures are typed so callers can isolate them

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::{CatalogItem, Marketplace, OfferId, UpdateInstruction};

/// Failure of a single marketplace call.
#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
  /// The request exceeded its deadline.
  #[error("request timed out: {0}")]
  Timeout(String),
  /// Transport-level failure (DNS, TLS, refused, reset).
  #[error("connection error: {0}")]
  Connection(String),
  /// The marketplace throttled us.
  #[error("rate limited by marketplace")]
  RateLimited,
  /// Non-success HTTP status.
  #[error("API error {status}: {body}")]
  Api {
    /// HTTP status code.
    status: u16,
    /// Response body, truncated.
    body: String,
  },
  /// Response body did not match the expected shape.
  #[error("failed to decode response: {0}")]
  Decode(String),
}

impl MarketplaceError {
  /// Short machine-friendly kind for logs and summaries.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Timeout(_) => "timeout",
      Self::Connection(_) => "connection",
      Self::RateLimited => "rate_limited",
      Self::Api { .. } => "api",
      Self::Decode(_) => "decode",
    }
  }

  /// Whether a retry of the same request could succeed.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Timeout(_) | Self::Connection(_) | Self::RateLimited => true,
      Self::Api { status, .. } => *status >= 500,
      Self::Decode(_) => false,
    }
  }
}

/// Per-offer result reported by the marketplace for a write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
  /// Offer the result applies to.
  pub offer_id: OfferId,
  /// Rejection reason; `None` means the write was accepted.
  pub error: Option<String>,
}

impl ItemOutcome {
  /// Accepted write.
  pub fn accepted(offer_id: impl Into<OfferId>) -> Self {
    Self {
      offer_id: offer_id.into(),
      error: None,
    }
  }

  /// Rejected write.
  pub fn rejected(offer_id: impl Into<OfferId>, reason: impl Into<String>) -> Self {
    Self {
      offer_id: offer_id.into(),
      error: Some(reason.into()),
    }
  }

  pub fn is_accepted(&self) -> bool {
    self.error.is_none()
  }
}

/// Trait for marketplace API clients.
///
/// Implementors own their credentials and endpoint details. The
/// dispatcher never sends more than `price_batch_size()` /
/// `stock_batch_size()` instructions in one call.
#[async_trait]
pub trait MarketplaceClient: Send + Sync + 'static {
  /// Which marketplace this client talks to.
  fn marketplace(&self) -> Marketplace;

  /// Human-readable target label (store or campaign).
  fn target(&self) -> String;

  /// List every offer in the seller catalog, following pagination.
  async fn list_products(&self) -> Result<Vec<CatalogItem>, MarketplaceError>;

  /// Write prices for one batch. Instructions without a price are
  /// never passed here.
  async fn update_prices(
    &self,
    batch: &[UpdateInstruction],
  ) -> Result<Vec<ItemOutcome>, MarketplaceError>;

  /// Write stock levels for one batch.
  async fn update_stocks(
    &self,
    batch: &[UpdateInstruction],
  ) -> Result<Vec<ItemOutcome>, MarketplaceError>;

  /// Maximum instructions per price request.
  fn price_batch_size(&self) -> usize;

  /// Maximum instructions per stock request.
  fn stock_batch_size(&self) -> usize;
}
