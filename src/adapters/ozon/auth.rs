//! Ozon Seller API Credentials
//!
//! Every request carries the store's `Client-Id` and `Api-Key`
//! headers. Both come from environment variables
//! (OZON_CLIENT_ID, OZON_SELLER_TOKEN).

use anyhow::{Context, Result};
use reqwest::RequestBuilder;

/// Ozon store credentials.
#[derive(Clone)]
pub struct OzonCredentials {
  /// Store identifier (`Client-Id`).
  client_id: String,
  /// Seller API key (`Api-Key`), never logged.
  api_key: String,
}

impl OzonCredentials {
  pub fn new(client_id: impl Into<String>, api_key: impl Into<String>) -> Self {
    Self {
      client_id: client_id.into(),
      api_key: api_key.into(),
    }
  }

  /// Load credentials from environment variables.
  ///
  /// Required env vars: OZON_CLIENT_ID, OZON_SELLER_TOKEN.
  pub fn from_env() -> Result<Self> {
    let client_id = std::env::var("OZON_CLIENT_ID").context("OZON_CLIENT_ID not set")?;
    let api_key = std::env::var("OZON_SELLER_TOKEN").context("OZON_SELLER_TOKEN not set")?;

    anyhow::ensure!(!client_id.trim().is_empty(), "OZON_CLIENT_ID is empty");
    anyhow::ensure!(!api_key.trim().is_empty(), "OZON_SELLER_TOKEN is empty");

    Ok(Self::new(client_id, api_key))
  }

  pub fn client_id(&self) -> &str {
    &self.client_id
  }

  /// Attach auth headers to a request.
  pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
    request
      .header("Client-Id", &self.client_id)
      .header("Api-Key", &self.api_key)
  }
}

impl std::fmt::Debug for OzonCredentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OzonCredentials")
      .field("client_id", &self.client_id)
      .field("api_key", &"****")
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_debug_masks_api_key() {
    let creds = OzonCredentials::new("12345", "secret-key");
    let out = format!("{creds:?}");
    assert!(out.contains("12345"));
    assert!(!out.contains("secret-key"));
  }

  #[test]
  fn test_apply_sets_headers() {
    let creds = OzonCredentials::new("12345", "secret-key");
    let req = creds
      .apply(reqwest::Client::new().post("https://api-seller.ozon.ru/v3/product/list"))
      .build()
      .unwrap();
    assert_eq!(req.headers()["Client-Id"], "12345");
    assert_eq!(req.headers()["Api-Key"], "secret-key");
  }
}
