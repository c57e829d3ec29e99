//! Yandex.Market Campaign Client — Adapter for One Campaign
//!
//! Implements the `MarketplaceClient` port for a single campaign and
//! warehouse using the shared `ApiClient`. The update endpoints accept
//! or reject a request as a whole, so every offer in a batch shares the
//! same outcome.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info, instrument};

use super::auth::MarketToken;
use super::types::{
  MappingQuery, MappingResponse, MappingResult, OfferPrice, PriceUpdateRequest, PriceValue, SkuStock,
  StockItem, StockUpdateRequest, UpdateResponse,
};
use crate::adapters::http::ApiClient;
use crate::domain::catalog::{CatalogItem, Marketplace, UpdateInstruction};
use crate::ports::marketplace::{ItemOutcome, MarketplaceClient, MarketplaceError};

/// A campaign and the warehouse its stock lives in.
#[derive(Debug, Clone)]
pub struct Campaign {
  /// Label used in logs (e.g. "FBS").
  pub name: String,
  /// Campaign ID.
  pub campaign_id: String,
  /// Warehouse ID for stock updates.
  pub warehouse_id: u64,
}

/// Paging and batching limits for the Partner API.
#[derive(Debug, Clone, Copy)]
pub struct YandexLimits {
  /// Offers per mapping page.
  pub page_limit: u32,
  /// Offers per price update.
  pub price_batch_size: usize,
  /// Offers per stock update.
  pub stock_batch_size: usize,
}

impl Default for YandexLimits {
  fn default() -> Self {
    Self {
      page_limit: 200,
      price_batch_size: 500,
      stock_batch_size: 2000,
    }
  }
}

/// Yandex.Market client bound to one campaign.
pub struct YandexMarketClient {
  /// Rate-limited HTTP client.
  api: ApiClient,
  /// Account token.
  token: MarketToken,
  /// Target campaign.
  campaign: Campaign,
  /// Paging and batching limits.
  limits: YandexLimits,
}

impl YandexMarketClient {
  /// Create a new campaign client.
  pub fn new(api: ApiClient, token: MarketToken, campaign: Campaign, limits: YandexLimits) -> Self {
    Self {
      api,
      token,
      campaign,
      limits,
    }
  }

  fn path(&self, suffix: &str) -> String {
    format!("/campaigns/{}/{}", self.campaign.campaign_id, suffix)
  }

  async fn send_update(
    &self,
    request: reqwest::RequestBuilder,
    label: &str,
    batch: &[UpdateInstruction],
  ) -> Result<Vec<ItemOutcome>, MarketplaceError> {
    let response: UpdateResponse = self.api.send_json(self.token.apply(request), label).await?;
    Ok(batch_outcomes(batch, response.rejection()))
  }
}

/// Follow `nextPageToken` from the first page until the marketplace
/// stops returning one or sends an empty page.
async fn collect_offers<F, Fut>(mut fetch_page: F) -> Result<Vec<CatalogItem>, MarketplaceError>
where
  F: FnMut(String) -> Fut,
  Fut: Future<Output = Result<MappingResult, MarketplaceError>>,
{
  let mut items = Vec::new();
  let mut page_token = String::new();

  loop {
    let page = fetch_page(page_token).await?;
    if page.offer_mapping_entries.is_empty() {
      break;
    }
    items.extend(
      page
        .offer_mapping_entries
        .into_iter()
        .map(|e| CatalogItem::listed(e.offer.shop_sku)),
    );
    debug!(collected = items.len(), "Fetched offer mapping page");

    match page.paging.next_page_token {
      Some(next) if !next.is_empty() => page_token = next,
      _ => break,
    }
  }

  Ok(items)
}

/// Same verdict for every offer in the batch.
fn batch_outcomes(batch: &[UpdateInstruction], rejection: Option<String>) -> Vec<ItemOutcome> {
  batch
    .iter()
    .map(|i| match &rejection {
      None => ItemOutcome::accepted(&i.offer_id),
      Some(reason) => ItemOutcome::rejected(&i.offer_id, reason.clone()),
    })
    .collect()
}

fn offer_price(instruction: &UpdateInstruction) -> Option<OfferPrice> {
  let value = instruction.price?.trunc().to_u64()?;
  Some(OfferPrice {
    id: instruction.offer_id.clone(),
    price: PriceValue {
      value,
      currency_id: "RUR".to_string(),
    },
  })
}

fn sku_stock(instruction: &UpdateInstruction, warehouse_id: u64, at: DateTime<Utc>) -> SkuStock {
  SkuStock {
    sku: instruction.offer_id.clone(),
    warehouse_id,
    items: vec![StockItem {
      count: instruction.stock,
      kind: "FIT".to_string(),
      updated_at: at.to_rfc3339_opts(SecondsFormat::Secs, true),
    }],
  }
}

#[async_trait]
impl MarketplaceClient for YandexMarketClient {
  fn marketplace(&self) -> Marketplace {
    Marketplace::YandexMarket
  }

  fn target(&self) -> String {
    format!("yandex:{}:{}", self.campaign.name, self.campaign.campaign_id)
  }

  #[instrument(skip(self), fields(target = %self.target()))]
  async fn list_products(&self) -> Result<Vec<CatalogItem>, MarketplaceError> {
    let path = self.path("offer-mapping-entries");
    let items = collect_offers(|page_token| {
      let query = MappingQuery {
        page_token,
        limit: self.limits.page_limit,
      };
      let request = self.token.apply(self.api.request(Method::GET, &path)).query(&query);
      let path = path.as_str();
      async move {
        let response: MappingResponse = self.api.send_json(request, path).await?;
        Ok(response.result)
      }
    })
    .await?;

    info!(offers = items.len(), "Yandex.Market catalog loaded");
    Ok(items)
  }

  #[instrument(skip(self, batch), fields(size = batch.len()))]
  async fn update_prices(
    &self,
    batch: &[UpdateInstruction],
  ) -> Result<Vec<ItemOutcome>, MarketplaceError> {
    let path = self.path("offer-prices/updates");
    let body = PriceUpdateRequest {
      offers: batch.iter().filter_map(offer_price).collect(),
    };
    let request = self.api.request(Method::POST, &path).json(&body);
    self.send_update(request, &path, batch).await
  }

  #[instrument(skip(self, batch), fields(size = batch.len()))]
  async fn update_stocks(
    &self,
    batch: &[UpdateInstruction],
  ) -> Result<Vec<ItemOutcome>, MarketplaceError> {
    let path = self.path("offers/stocks");
    let now = Utc::now();
    let body = StockUpdateRequest {
      skus: batch
        .iter()
        .map(|i| sku_stock(i, self.campaign.warehouse_id, now))
        .collect(),
    };
    let request = self.api.request(Method::PUT, &path).json(&body);
    self.send_update(request, &path, batch).await
  }

  fn price_batch_size(&self) -> usize {
    self.limits.price_batch_size
  }

  fn stock_batch_size(&self) -> usize {
    self.limits.stock_batch_size
  }
}
