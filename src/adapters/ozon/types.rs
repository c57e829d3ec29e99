//! Ozon Seller API Request/Response Types
//!
//! Serialization types for the product list and the price/stock
//! import endpoints. Unknown response fields are ignored.

use serde::{Deserialize, Serialize};

/// `POST /v3/product/list` request body.
#[derive(Debug, Clone, Serialize)]
pub struct ProductListRequest {
  pub filter: ProductListFilter,
  /// Cursor from the previous page; empty on the first call.
  pub last_id: String,
  pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductListFilter {
  /// "ALL" lists archived and hidden offers too.
  pub visibility: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductListResponse {
  pub result: ProductListResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductListResult {
  #[serde(default)]
  pub items: Vec<ProductListItem>,
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub last_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductListItem {
  #[serde(default)]
  pub product_id: i64,
  pub offer_id: String,
}

/// `POST /v1/product/import/prices` request body.
#[derive(Debug, Clone, Serialize)]
pub struct ImportPricesRequest {
  pub prices: Vec<PriceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceEntry {
  /// Promotions toggle; "UNKNOWN" leaves it as is.
  pub auto_action_enabled: String,
  pub currency_code: String,
  pub offer_id: String,
  /// Crossed-out price; "0" clears it.
  pub old_price: String,
  /// Whole rubles as a string.
  pub price: String,
}

/// `POST /v1/product/import/stocks` request body.
#[derive(Debug, Clone, Serialize)]
pub struct ImportStocksRequest {
  pub stocks: Vec<StockEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockEntry {
  pub offer_id: String,
  pub stock: u32,
}

/// Shared response of both import endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportResponse {
  #[serde(default)]
  pub result: Vec<ImportResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportResult {
  pub offer_id: String,
  #[serde(default)]
  pub updated: bool,
  #[serde(default)]
  pub errors: Vec<ImportError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportError {
  #[serde(default)]
  pub code: String,
  #[serde(default)]
  pub message: String,
}

impl ImportResult {
  /// Joined error text, or a generic reason when `updated` is false
  /// without details.
  pub fn rejection(&self) -> Option<String> {
    if self.updated && self.errors.is_empty() {
      return None;
    }
    if self.errors.is_empty() {
      return Some("not updated".to_string());
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

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_price_entry_serialization() {
    let req = ImportPricesRequest {
      prices: vec![PriceEntry {
        auto_action_enabled: "UNKNOWN".to_string(),
        currency_code: "RUB".to_string(),
        offer_id: "GA-2100-1A".to_string(),
        old_price: "0".to_string(),
        price: "5990".to_string(),
      }],
    };

    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["prices"][0]["price"], "5990");
    assert_eq!(json["prices"][0]["currency_code"], "RUB");
  }

  #[test]
  fn test_product_list_response_deserialization() {
    let json = r#"{"result": {"items": [{"product_id": 1, "offer_id": "A"}], "total": 3, "last_id": "abc"}}"#;
    let resp: ProductListResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.result.items[0].offer_id, "A");
    assert_eq!(resp.result.total, 3);
    assert_eq!(resp.result.last_id, "abc");
  }

  #[test]
  fn test_import_result_rejection() {
    let json = r#"{"result": [
      {"offer_id": "A", "updated": true, "errors": []},
      {"offer_id": "B", "updated": false, "errors": [{"code": "NOT_FOUND", "message": "no such offer"}]},
      {"offer_id": "C", "updated": false}
    ]}"#;
    let resp: ImportResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.result[0].rejection(), None);
    assert_eq!(resp.result[1].rejection().unwrap(), "NOT_FOUND: no such offer");
    assert_eq!(resp.result[2].rejection().unwrap(), "not updated");
  }
}
