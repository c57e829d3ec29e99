//! Yandex.Market Partner API Request/Response Types
//!
//! Serialization types for campaign offer mappings and the price and
//! stock update endpoints. Field names follow the API's camelCase.

use serde::{Deserialize, Serialize};

/// `GET /campaigns/{id}/offer-mapping-entries` query.
#[derive(Debug, Clone, Serialize)]
pub struct MappingQuery {
  #[serde(skip_serializing_if = "String::is_empty")]
  pub page_token: String,
  pub limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingResponse {
  pub result: MappingResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResult {
  #[serde(default)]
  pub offer_mapping_entries: Vec<MappingEntry>,
  #[serde(default)]
  pub paging: Paging,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
  pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingEntry {
  pub offer: MappingOffer,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingOffer {
  /// Seller article.
  pub shop_sku: String,
}

/// `POST /campaigns/{id}/offer-prices/updates` request body.
#[derive(Debug, Clone, Serialize)]
pub struct PriceUpdateRequest {
  pub offers: Vec<OfferPrice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferPrice {
  /// Seller article.
  pub id: String,
  pub price: PriceValue,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceValue {
  /// Whole rubles.
  pub value: u64,
  pub currency_id: String,
}

/// `PUT /campaigns/{id}/offers/stocks` request body.
#[derive(Debug, Clone, Serialize)]
pub struct StockUpdateRequest {
  pub skus: Vec<SkuStock>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuStock {
  pub sku: String,
  pub warehouse_id: u64,
  pub items: Vec<StockItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
  pub count: u32,
  /// Stock kind; "FIT" is sellable stock.
  #[serde(rename = "type")]
  pub kind: String,
  /// RFC 3339, second precision, `Z` suffix.
  pub updated_at: String,
}

/// Response of both update endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub errors: Vec<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
  #[serde(default)]
  pub code: String,
  #[serde(default)]
  pub message: String,
}

impl UpdateResponse {
  /// Rejection text for the whole request, `None` on "OK".
  pub fn rejection(&self) -> Option<String> {
    if self.status.eq_ignore_ascii_case("OK") {
      return None;
    }
    if self.errors.is_empty() {
      return Some(format!("status {}", self.status));
    }
    Some(
      self
        .errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; "),
    )
  }
}
