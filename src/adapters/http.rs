//! Marketplace HTTP Client - Rate-limited REST API Client
//!
//! Wraps reqwest with concurrency limiting, request pacing, optional
//! retries and error classification for the marketplace adapters.
//! Each marketplace adapter owns one `ApiClient` and adds its own
//! authentication headers.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::ports::marketplace::MarketplaceError;

/// Longest response body kept in error messages.
const BODY_PREVIEW_CHARS: usize = 500;

/// Configuration for one marketplace HTTP client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
  /// Base URL for the marketplace API.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
  /// Request pacing.
  pub requests_per_second: u32,
}

impl ApiClientConfig {
  /// Build from the shared `[http]` section and an adapter base URL.
  pub fn from_http(base_url: impl Into<String>, http: &HttpConfig) -> Self {
    Self {
      base_url: base_url.into(),
      timeout: Duration::from_secs(http.timeout_secs),
      max_concurrent: http.max_concurrent,
      max_retries: http.max_retries,
      retry_base_delay: Duration::from_millis(http.retry_base_delay_ms),
      requests_per_second: http.requests_per_second,
    }
  }
}

/// Rate-limited HTTP client for a marketplace API.
pub struct ApiClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: ApiClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
  /// Request pacing.
  limiter: DefaultDirectRateLimiter,
}

impl ApiClient {
  /// Create a new API client.
  pub fn new(config: ApiClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
    let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
    let limiter = RateLimiter::direct(Quota::per_second(rps));

    Ok(Self {
      http,
      config,
      semaphore,
      limiter,
    })
  }

  /// Start a request against `base_url + path`.
  pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
    self.http.request(method, url)
  }

  /// Send a prepared request and decode its JSON body.
  pub async fn send_json<T: DeserializeOwned>(
    &self,
    request: RequestBuilder,
    label: &str,
  ) -> Result<T, MarketplaceError> {
    let body = self.execute_with_retry(request, label).await?;
    serde_json::from_str(&body).map_err(|e| {
      warn!(endpoint = label, error = %e, body = %preview(&body), "Unexpected response shape");
      MarketplaceError::Decode(e.to_string())
    })
  }

  /// Execute request with rate limiting and retries.
  ///
  /// Only transient failures are retried; with `max_retries = 0`
  /// every failure is returned on first occurrence.
  async fn execute_with_retry(
    &self,
    request: RequestBuilder,
    label: &str,
  ) -> Result<String, MarketplaceError> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .map_err(|_| MarketplaceError::Connection("client shut down".to_string()))?;

    let mut attempt = 0;
    loop {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(endpoint = label, attempt, delay_ms = delay.as_millis(), "Retrying request");
        sleep(delay).await;
      }

      let req = request
        .try_clone()
        .ok_or_else(|| MarketplaceError::Connection("request body not cloneable".to_string()))?;

      self.limiter.until_ready().await;

      let result = match req.send().await {
        Ok(response) => read_response(response).await,
        Err(e) => Err(classify(&e)),
      };

      match result {
        Ok(body) => return Ok(body),
        Err(e) if e.is_transient() && attempt < self.config.max_retries => {
          warn!(endpoint = label, error = %e, attempt, "Request failed, will retry");
          attempt += 1;
        }
        Err(e) => {
          warn!(endpoint = label, error = %e, kind = e.kind(), "Request failed");
          return Err(e);
        }
      }
    }
  }
}

/// Turn a response into its body text or a typed error.
async fn read_response(response: reqwest::Response) -> Result<String, MarketplaceError> {
  let status = response.status();
  let body = response.text().await.map_err(|e| classify(&e))?;

  match status {
    s if s.is_success() => Ok(body),
    StatusCode::TOO_MANY_REQUESTS => Err(MarketplaceError::RateLimited),
    s => Err(MarketplaceError::Api {
      status: s.as_u16(),
      body: preview(&body),
    }),
  }
}

/// Map a transport error onto the marketplace error taxonomy.
pub fn classify(err: &reqwest::Error) -> MarketplaceError {
  if err.is_timeout() {
    MarketplaceError::Timeout(err.to_string())
  } else if err.is_decode() || err.is_body() {
    MarketplaceError::Decode(err.to_string())
  } else if let Some(status) = err.status() {
    MarketplaceError::Api {
      status: status.as_u16(),
      body: err.to_string(),
    }
  } else {
    MarketplaceError::Connection(err.to_string())
  }
}

fn preview(body: &str) -> String {
  let mut out: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
  if out.len() < body.len() {
    out.push_str("...");
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_preview_truncates_long_bodies() {
    let body = "x".repeat(BODY_PREVIEW_CHARS + 10);
    let p = preview(&body);
    assert!(p.ends_with("..."));
    assert_eq!(p.len(), BODY_PREVIEW_CHARS + 3);
    assert_eq!(preview("short"), "short");
  }

  #[test]
  fn test_request_joins_base_url() {
    let client = ApiClient::new(ApiClientConfig::from_http(
      "https://api-seller.ozon.ru/",
      &HttpConfig::default(),
    ))
    .unwrap();
    let req = client.request(Method::POST, "/v3/product/list").build().unwrap();
    assert_eq!(req.url().as_str(), "https://api-seller.ozon.ru/v3/product/list");
  }

  #[tokio::test]
  async fn test_connection_refused_is_classified() {
    let client = ApiClient::new(ApiClientConfig {
      base_url: "http://127.0.0.1:9".to_string(),
      timeout: Duration::from_secs(2),
      max_concurrent: 1,
      max_retries: 0,
      retry_base_delay: Duration::from_millis(1),
      requests_per_second: 100,
    })
    .unwrap();

    let err = client
      .send_json::<serde_json::Value>(client.request(Method::GET, "/"), "ping")
      .await
      .unwrap_err();
    assert!(matches!(err, MarketplaceError::Connection(_) | MarketplaceError::Timeout(_)));
  }
}
