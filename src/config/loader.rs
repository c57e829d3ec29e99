//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    ozon = config.ozon.as_ref().is_some_and(|o| o.enabled),
    yandex_campaigns = config
      .yandex
      .as_ref()
      .filter(|y| y.enabled)
      .map_or(0, |y| y.campaigns.len()),
    dry_run = config.sync.dry_run,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - At least one enabled marketplace target
/// - Exactly one feed source
/// - Positive batch sizes, timeouts and rates
/// - Non-empty campaign definitions
fn validate_config(config: &AppConfig) -> Result<()> {
  let ozon_enabled = config.ozon.as_ref().is_some_and(|o| o.enabled);
  let yandex_enabled = config.yandex.as_ref().is_some_and(|y| y.enabled);
  anyhow::ensure!(
    ozon_enabled || yandex_enabled,
    "At least one marketplace target (ozon or yandex) must be enabled"
  );

  // Sync validation
  anyhow::ensure!(
    config.sync.run_timeout_secs > 0,
    "run_timeout_secs must be positive"
  );
  anyhow::ensure!(
    config.sync.max_in_flight > 0,
    "max_in_flight must be positive"
  );

  // HTTP validation
  anyhow::ensure!(
    config.http.timeout_secs > 0,
    "http.timeout_secs must be positive"
  );
  anyhow::ensure!(
    config.http.max_concurrent > 0,
    "http.max_concurrent must be positive"
  );
  anyhow::ensure!(
    config.http.requests_per_second > 0,
    "http.requests_per_second must be positive"
  );

  // Feed validation
  anyhow::ensure!(
    config.feed.url.is_some() != config.feed.path.is_some(),
    "Exactly one of feed.url or feed.path must be set"
  );
  anyhow::ensure!(
    !config.feed.id_column.is_empty()
      && !config.feed.price_column.is_empty()
      && !config.feed.stock_column.is_empty(),
    "Feed column names must not be empty"
  );

  if let Some(ozon) = config.ozon.as_ref().filter(|o| o.enabled) {
    anyhow::ensure!(!ozon.base_url.is_empty(), "Ozon base_url must not be empty");
    anyhow::ensure!(
      ozon.page_limit > 0 && ozon.price_batch_size > 0 && ozon.stock_batch_size > 0,
      "Ozon page_limit and batch sizes must be positive"
    );
  }

  if let Some(yandex) = config.yandex.as_ref().filter(|y| y.enabled) {
    anyhow::ensure!(
      !yandex.base_url.is_empty(),
      "Yandex.Market base_url must not be empty"
    );
    anyhow::ensure!(
      yandex.page_limit > 0 && yandex.price_batch_size > 0 && yandex.stock_batch_size > 0,
      "Yandex.Market page_limit and batch sizes must be positive"
    );
    anyhow::ensure!(
      !yandex.campaigns.is_empty(),
      "At least one Yandex.Market campaign must be configured"
    );
    for (i, campaign) in yandex.campaigns.iter().enumerate() {
      anyhow::ensure!(
        !campaign.campaign_id.is_empty(),
        "Campaign {} ({}) has empty campaign_id",
        i,
        campaign.name
      );
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::pricing::PriceRounding;

  const MINIMAL: &str = r#"
    [sync]
    name = "test"

    [feed]
    url = "https://example.com/ostatki.zip"

    [ozon]
    zero_missing_stock = true
    rounding = "half_up"

    [yandex]
    max_stock = 999

    [[yandex.campaigns]]
    name = "FBS"
    campaign_id = "111"
    warehouse_id = 222
  "#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_defaults_and_flattened_policy() {
    let config = parse_config(MINIMAL).unwrap();

    assert_eq!(config.sync.log_level, "info");
    assert_eq!(config.http.max_retries, 0);
    assert_eq!(config.feed.delimiter, ';');
    assert_eq!(config.feed.id_column, "Код");

    let ozon = config.ozon.unwrap();
    assert_eq!(ozon.price_batch_size, 1000);
    assert_eq!(ozon.stock_batch_size, 100);
    assert!(ozon.policy.zero_missing_stock);
    assert_eq!(ozon.policy.rounding, PriceRounding::HalfUp);

    let yandex = config.yandex.unwrap();
    assert_eq!(yandex.price_batch_size, 500);
    assert_eq!(yandex.stock_batch_size, 2000);
    assert_eq!(yandex.policy.max_stock, Some(999));
    assert!(!yandex.policy.zero_missing_stock);
    assert_eq!(yandex.campaigns[0].warehouse_id, 222);
  }

  #[test]
  fn test_example_config_is_valid() {
    let config = parse_config(include_str!("../../config.example.toml")).unwrap();
    assert_eq!(config.yandex.unwrap().campaigns.len(), 2);
    assert!(!config.sync.dry_run);
  }

  #[test]
  fn test_rejects_two_feed_sources() {
    let text = MINIMAL.replace(
      "url = \"https://example.com/ostatki.zip\"",
      "url = \"https://example.com/a.zip\"\n    path = \"a.zip\"",
    );
    assert!(parse_config(&text).is_err());
  }

  #[test]
  fn test_rejects_no_targets() {
    let text = r#"
      [sync]
      name = "test"

      [feed]
      path = "ostatki.csv"
    "#;
    assert!(parse_config(text).is_err());
  }

  #[test]
  fn test_rejects_empty_campaigns() {
    let text = r#"
      [sync]
      name = "test"

      [feed]
      path = "ostatki.csv"

      [yandex]
      campaigns = []
    "#;
    assert!(parse_config(text).is_err());
  }
}
