//! Configuration Module - TOML-based Sync Configuration
//!
//! Loads and validates configuration from `config.toml`. Credentials
//! are never stored here; adapters read them from environment variables.
//! Endpoints, batch limits and reconciliation policy are externalized
//! here - nothing is hardcoded in the domain layer.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::domain::pricing::PriceRounding;
use crate::domain::reconcile::ReconcileOptions;

/// Top-level sync configuration.
///
/// Loaded from `config.toml` at startup. At least one of `ozon` or
/// `yandex` must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Job identity and run-level behavior.
  pub sync: SyncConfig,
  /// Shared HTTP client settings.
  #[serde(default)]
  pub http: HttpConfig,
  /// Supplier stock list source.
  pub feed: FeedConfig,
  /// Ozon seller store target.
  pub ozon: Option<OzonConfig>,
  /// Yandex.Market campaign targets.
  pub yandex: Option<YandexConfig>,
}

/// Job identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
  /// Human-readable job name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Compute and log the plan without sending writes.
  #[serde(default)]
  pub dry_run: bool,
  /// Upper bound for fetching and reconciling one target. Writes are
  /// bounded per request by `http.timeout_secs`.
  #[serde(default = "default_run_timeout")]
  pub run_timeout_secs: u64,
  /// Concurrent write batches per stream (prices, stocks).
  #[serde(default = "default_max_in_flight")]
  pub max_in_flight: usize,
}

impl SyncConfig {
  pub fn run_timeout(&self) -> Duration {
    Duration::from_secs(self.run_timeout_secs)
  }
}

/// HTTP client configuration shared by all adapters.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
  /// Per-request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
  /// Maximum concurrent requests per client.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Automatic retries on transient errors (0 = report immediately).
  #[serde(default)]
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  #[serde(default = "default_retry_delay")]
  pub retry_base_delay_ms: u64,
  /// Request pacing per client.
  #[serde(default = "default_rps")]
  pub requests_per_second: u32,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      timeout_secs: default_timeout(),
      max_concurrent: default_max_concurrent(),
      max_retries: 0,
      retry_base_delay_ms: default_retry_delay(),
      requests_per_second: default_rps(),
    }
  }
}

/// Supplier feed configuration.
///
/// Exactly one of `url` or `path` must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  /// Download location (zip archive or bare CSV).
  pub url: Option<String>,
  /// Local file (zip archive or bare CSV).
  pub path: Option<String>,
  /// CSV field delimiter.
  #[serde(default = "default_delimiter")]
  pub delimiter: char,
  /// Header of the article column.
  #[serde(default = "default_id_column")]
  pub id_column: String,
  /// Header of the price column.
  #[serde(default = "default_price_column")]
  pub price_column: String,
  /// Header of the quantity column.
  #[serde(default = "default_stock_column")]
  pub stock_column: String,
}

/// Per-marketplace reconciliation policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfig {
  /// Whole-ruble rounding mode.
  #[serde(default)]
  pub rounding: PriceRounding,
  /// Largest stock the marketplace accepts.
  pub max_stock: Option<u32>,
  /// Zero the stock of listed offers missing from the supplier list.
  #[serde(default)]
  pub zero_missing_stock: bool,
}

impl PolicyConfig {
  pub fn reconcile_options(&self) -> ReconcileOptions {
    ReconcileOptions {
      rounding: self.rounding,
      max_stock: self.max_stock,
      zero_missing_stock: self.zero_missing_stock,
    }
  }
}

/// Ozon Seller API target.
#[derive(Debug, Clone, Deserialize)]
pub struct OzonConfig {
  /// Whether this target runs.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Seller API base URL.
  #[serde(default = "default_ozon_url")]
  pub base_url: String,
  /// Offers per product list page.
  #[serde(default = "default_ozon_page_limit")]
  pub page_limit: u32,
  /// Offers per price import request.
  #[serde(default = "default_ozon_price_batch")]
  pub price_batch_size: usize,
  /// Offers per stock import request.
  #[serde(default = "default_ozon_stock_batch")]
  pub stock_batch_size: usize,
  /// Reconciliation policy.
  #[serde(flatten)]
  pub policy: PolicyConfig,
}

/// Yandex.Market Partner API targets.
#[derive(Debug, Clone, Deserialize)]
pub struct YandexConfig {
  /// Whether these targets run.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Partner API base URL.
  #[serde(default = "default_yandex_url")]
  pub base_url: String,
  /// Offers per mapping page.
  #[serde(default = "default_yandex_page_limit")]
  pub page_limit: u32,
  /// Offers per price update request.
  #[serde(default = "default_yandex_price_batch")]
  pub price_batch_size: usize,
  /// Offers per stock update request.
  #[serde(default = "default_yandex_stock_batch")]
  pub stock_batch_size: usize,
  /// Reconciliation policy, shared by all campaigns.
  #[serde(flatten)]
  pub policy: PolicyConfig,
  /// Campaigns to sync (e.g. FBS and DBS).
  pub campaigns: Vec<CampaignConfig>,
}

/// One Yandex.Market campaign and its warehouse.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
  /// Label used in logs.
  pub name: String,
  /// Campaign ID.
  pub campaign_id: String,
  /// Warehouse that stock updates target.
  pub warehouse_id: u64,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_run_timeout() -> u64 {
  600
}

fn default_max_in_flight() -> usize {
  4
}

fn default_timeout() -> u64 {
  30
}

fn default_max_concurrent() -> usize {
  8
}

fn default_retry_delay() -> u64 {
  500
}

fn default_rps() -> u32 {
  5
}

fn default_delimiter() -> char {
  ';'
}

fn default_id_column() -> String {
  "Код".to_string()
}

fn default_price_column() -> String {
  "Цена".to_string()
}

fn default_stock_column() -> String {
  "Количество".to_string()
}

fn default_ozon_url() -> String {
  "https://api-seller.ozon.ru".to_string()
}

fn default_ozon_page_limit() -> u32 {
  1000
}

fn default_ozon_price_batch() -> usize {
  1000
}

fn default_ozon_stock_batch() -> usize {
  100
}

fn default_yandex_url() -> String {
  "https://api.partner.market.yandex.ru".to_string()
}

fn default_yandex_page_limit() -> u32 {
  200
}

fn default_yandex_price_batch() -> usize {
  500
}

fn default_yandex_stock_batch() -> usize {
  2000
}
