//! Ozon Marketplace Client — Adapter for an Ozon Store
//!
//! Implements the `MarketplaceClient` port using the shared `ApiClient`
//! for rate-limited requests. Listing follows the `last_id` cursor;
//! price and stock imports report per-offer results.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, info, instrument};

use super::auth::OzonCredentials;
use super::types::{
  ImportPricesRequest, ImportResponse, ImportResult, ImportStocksRequest, PriceEntry,
  ProductListFilter, ProductListRequest, ProductListResponse, ProductListResult, StockEntry,
};
use crate::adapters::http::ApiClient;
use crate::domain::catalog::{CatalogItem, Marketplace, UpdateInstruction};
use crate::ports::marketplace::{ItemOutcome, MarketplaceClient, MarketplaceError};

const PRODUCT_LIST_PATH: &str = "/v3/product/list";
const IMPORT_PRICES_PATH: &str = "/v1/product/import/prices";
const IMPORT_STOCKS_PATH: &str = "/v1/product/import/stocks";

/// Paging and batching limits for the Ozon endpoints.
#[derive(Debug, Clone, Copy)]
pub struct OzonLimits {
  /// Offers per product list page.
  pub page_limit: u32,
  /// Offers per price import.
  pub price_batch_size: usize,
  /// Offers per stock import.
  pub stock_batch_size: usize,
}

impl Default for OzonLimits {
  fn default() -> Self {
    Self {
      page_limit: 1000,
      price_batch_size: 1000,
      stock_batch_size: 100,
    }
  }
}

/// Ozon store client backed by the shared rate-limited HTTP client.
pub struct OzonClient {
  /// Rate-limited HTTP client.
  api: ApiClient,
  /// Store credentials.
  credentials: OzonCredentials,
  /// Paging and batching limits.
  limits: OzonLimits,
}

impl OzonClient {
  /// Create a new Ozon client.
  pub fn new(api: ApiClient, credentials: OzonCredentials, limits: OzonLimits) -> Self {
    Self {
      api,
      credentials,
      limits,
    }
  }

  async fn fetch_page(&self, last_id: &str) -> Result<ProductListResult, MarketplaceError> {
    let body = ProductListRequest {
      filter: ProductListFilter {
        visibility: "ALL".to_string(),
      },
      last_id: last_id.to_string(),
      limit: self.limits.page_limit,
    };
    let request = self
      .credentials
      .apply(self.api.request(Method::POST, PRODUCT_LIST_PATH))
      .json(&body);

    let response: ProductListResponse = self.api.send_json(request, PRODUCT_LIST_PATH).await?;
    Ok(response.result)
  }

  async fn import(
    &self,
    path: &str,
    request: reqwest::RequestBuilder,
    batch: &[UpdateInstruction],
  ) -> Result<Vec<ItemOutcome>, MarketplaceError> {
    let request = self.credentials.apply(request);
    let response: ImportResponse = self.api.send_json(request, path).await?;
    Ok(map_outcomes(batch, &response.result))
  }
}

/// Follow the `last_id` cursor from the first page until the listing
/// is exhausted. `fetch_page` receives the cursor to request.
async fn collect_catalog<F, Fut>(mut fetch_page: F) -> Result<Vec<CatalogItem>, MarketplaceError>
where
  F: FnMut(String) -> Fut,
  Fut: Future<Output = Result<ProductListResult, MarketplaceError>>,
{
  let mut items = Vec::new();
  let mut last_id = String::new();

  loop {
    let page = fetch_page(last_id).await?;
    items.extend(page.items.iter().map(|p| CatalogItem::listed(p.offer_id.clone())));
    debug!(collected = items.len(), total = page.total, "Fetched product page");

    if listing_done(items.len(), &page) {
      break;
    }
    last_id = page.last_id;
  }

  Ok(items)
}

/// Whether the product list is exhausted after receiving `page`.
fn listing_done(collected: usize, page: &ProductListResult) -> bool {
  page.items.is_empty() || collected as u64 >= page.total || page.last_id.is_empty()
}

/// Pair each instruction with the marketplace's verdict for its offer.
///
/// Offers missing from the response count as rejected.
fn map_outcomes(batch: &[UpdateInstruction], results: &[ImportResult]) -> Vec<ItemOutcome> {
  let by_offer: HashMap<&str, &ImportResult> = results
    .iter()
    .map(|r| (r.offer_id.as_str(), r))
    .collect();

  batch
    .iter()
    .map(|instruction| match by_offer.get(instruction.offer_id.as_str()) {
      Some(result) => match result.rejection() {
        None => ItemOutcome::accepted(&instruction.offer_id),
        Some(reason) => ItemOutcome::rejected(&instruction.offer_id, reason),
      },
      None => ItemOutcome::rejected(&instruction.offer_id, "not acknowledged by Ozon"),
    })
    .collect()
}

fn price_entry(instruction: &UpdateInstruction) -> Option<PriceEntry> {
  let price = instruction.price?;
  Some(PriceEntry {
    auto_action_enabled: "UNKNOWN".to_string(),
    currency_code: "RUB".to_string(),
    offer_id: instruction.offer_id.clone(),
    old_price: "0".to_string(),
    price: price.normalize().to_string(),
  })
}

#[async_trait]
impl MarketplaceClient for OzonClient {
  fn marketplace(&self) -> Marketplace {
    Marketplace::Ozon
  }

  fn target(&self) -> String {
    format!("ozon:{}", self.credentials.client_id())
  }

  #[instrument(skip(self), fields(target = %self.target()))]
  async fn list_products(&self) -> Result<Vec<CatalogItem>, MarketplaceError> {
    let items = collect_catalog(|last_id| async move { self.fetch_page(&last_id).await }).await?;
    info!(offers = items.len(), "Ozon catalog loaded");
    Ok(items)
  }

  #[instrument(skip(self, batch), fields(size = batch.len()))]
  async fn update_prices(
    &self,
    batch: &[UpdateInstruction],
  ) -> Result<Vec<ItemOutcome>, MarketplaceError> {
    let body = ImportPricesRequest {
      prices: batch.iter().filter_map(price_entry).collect(),
    };
    let request = self.api.request(Method::POST, IMPORT_PRICES_PATH).json(&body);
    self.import(IMPORT_PRICES_PATH, request, batch).await
  }

  #[instrument(skip(self, batch), fields(size = batch.len()))]
  async fn update_stocks(
    &self,
    batch: &[UpdateInstruction],
  ) -> Result<Vec<ItemOutcome>, MarketplaceError> {
    let body = ImportStocksRequest {
      stocks: batch
        .iter()
        .map(|i| StockEntry {
          offer_id: i.offer_id.clone(),
          stock: i.stock,
        })
        .collect(),
    };
    let request = self.api.request(Method::POST, IMPORT_STOCKS_PATH).json(&body);
    self.import(IMPORT_STOCKS_PATH, request, batch).await
  }

  fn price_batch_size(&self) -> usize {
    self.limits.price_batch_size
  }

  fn stock_batch_size(&self) -> usize {
    self.limits.stock_batch_size
  }
}

#[cfg(test)]
mod tests {
  use std::collections::VecDeque;

  use super::*;
  use crate::adapters::ozon::types::{ImportError, ProductListItem};
  use rust_decimal_macros::dec;

  fn page(n: usize, total: u64, last_id: &str) -> ProductListResult {
    page_at(0, n, total, last_id)
  }

  /// Page of `n` offers numbered from `start`.
  fn page_at(start: usize, n: usize, total: u64, last_id: &str) -> ProductListResult {
    ProductListResult {
      items: (start..start + n)
        .map(|i| ProductListItem {
          product_id: i as i64,
          offer_id: format!("SKU-{i}"),
        })
        .collect(),
      total,
      last_id: last_id.to_string(),
    }
  }

  /// Serve canned pages in order, recording the cursor of each request.
  async fn walk(
    pages: Vec<ProductListResult>,
  ) -> (Result<Vec<CatalogItem>, MarketplaceError>, Vec<String>) {
    let mut pages = VecDeque::from(pages);
    let mut cursors = Vec::new();
    let result = collect_catalog(|last_id| {
      cursors.push(last_id);
      std::future::ready(
        pages
          .pop_front()
          .ok_or_else(|| MarketplaceError::Connection("no more pages".to_string())),
      )
    })
    .await;
    (result, cursors)
  }

  fn offer_ids(items: &[CatalogItem]) -> Vec<&str> {
    items.iter().map(|i| i.offer_id.as_str()).collect()
  }

  #[tokio::test]
  async fn test_catalog_follows_cursor_across_pages() {
    let (result, cursors) = walk(vec![
      page_at(0, 2, 5, "c1"),
      page_at(2, 2, 5, "c2"),
      page_at(4, 1, 5, "c3"),
    ])
    .await;

    let items = result.unwrap();
    assert_eq!(offer_ids(&items), ["SKU-0", "SKU-1", "SKU-2", "SKU-3", "SKU-4"]);
    assert_eq!(cursors, ["", "c1", "c2"]);
  }

  #[tokio::test]
  async fn test_catalog_stops_without_cursor() {
    let (result, cursors) = walk(vec![page_at(0, 2, 10, ""), page_at(2, 2, 10, "c2")]).await;

    assert_eq!(result.unwrap().len(), 2);
    assert_eq!(cursors, [""]);
  }

  #[tokio::test]
  async fn test_catalog_stops_on_empty_page() {
    let (result, cursors) = walk(vec![page_at(0, 2, 10, "c1"), page_at(2, 0, 10, "c2")]).await;

    assert_eq!(result.unwrap().len(), 2);
    assert_eq!(cursors, ["", "c1"]);
  }

  #[tokio::test]
  async fn test_catalog_page_error_fails_listing() {
    let (result, cursors) = walk(vec![page_at(0, 2, 10, "c1")]).await;

    assert!(matches!(result, Err(MarketplaceError::Connection(_))));
    assert_eq!(cursors, ["", "c1"]);
  }

  #[test]
  fn test_listing_done_when_total_reached() {
    assert!(listing_done(10, &page(10, 10, "next")));
    assert!(!listing_done(10, &page(10, 25, "next")));
  }

  #[test]
  fn test_listing_done_on_empty_page_or_cursor() {
    assert!(listing_done(10, &page(0, 25, "next")));
    assert!(listing_done(10, &page(10, 25, "")));
  }

  #[test]
  fn test_price_entry_whole_rubles() {
    let entry = price_entry(&UpdateInstruction {
      offer_id: "A".to_string(),
      price: Some(dec!(5990.00)),
      stock: 1,
    })
    .unwrap();
    assert_eq!(entry.price, "5990");
    assert_eq!(entry.old_price, "0");
  }

  #[test]
  fn test_stock_only_instruction_has_no_price_entry() {
    let entry = price_entry(&UpdateInstruction {
      offer_id: "A".to_string(),
      price: None,
      stock: 0,
    });
    assert!(entry.is_none());
  }

  #[test]
  fn test_map_outcomes() {
    let batch: Vec<UpdateInstruction> = ["A", "B", "C"]
      .iter()
      .map(|id| UpdateInstruction {
        offer_id: id.to_string(),
        price: Some(dec!(1)),
        stock: 1,
      })
      .collect();
    let results = vec![
      ImportResult {
        offer_id: "A".to_string(),
        updated: true,
        errors: vec![],
      },
      ImportResult {
        offer_id: "B".to_string(),
        updated: false,
        errors: vec![ImportError {
          code: "PRICE_INVALID".to_string(),
          message: "too low".to_string(),
        }],
      },
    ];

    let outcomes = map_outcomes(&batch, &results);
    assert!(outcomes[0].is_accepted());
    assert_eq!(outcomes[1].error.as_deref(), Some("PRICE_INVALID: too low"));
    assert_eq!(outcomes[2].error.as_deref(), Some("not acknowledged by Ozon"));
  }
}
