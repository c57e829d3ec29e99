//! Yandex.Market Partner API Credentials
//!
//! Bearer token shared by every campaign of the account, loaded from
//! the MARKET_TOKEN environment variable.

use anyhow::{Context, Result};
use reqwest::RequestBuilder;

/// Partner API OAuth/API token.
#[derive(Clone)]
pub struct MarketToken(String);

impl MarketToken {
  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }

  /// Load the token from MARKET_TOKEN.
  pub fn from_env() -> Result<Self> {
    let token = std::env::var("MARKET_TOKEN").context("MARKET_TOKEN not set")?;
    anyhow::ensure!(!token.trim().is_empty(), "MARKET_TOKEN is empty");
    Ok(Self(token))
  }

  /// Attach the bearer header to a request.
  pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
    request
      .bearer_auth(&self.0)
      .header("Accept", "application/json")
  }
}

impl std::fmt::Debug for MarketToken {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("MarketToken(****)")
  }
}
