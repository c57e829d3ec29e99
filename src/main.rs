//! Marketplace Stock Sync — Entry Point
//!
//! One-shot batch job: pushes the supplier's prices and stock levels
//! to every configured marketplace target, then exits.
//!
//! Wiring sequence:
//! 1. Parse CLI arguments (config path, --dry-run, --only <marketplace>)
//! 2. Load config.toml + validate
//! 3. Init tracing (JSON structured logging)
//! 4. Create the supplier feed (downloaded once, shared by all targets)
//! 5. Load credentials from env vars (OZON_CLIENT_ID, OZON_SELLER_TOKEN, MARKET_TOKEN)
//! 6. Build one pipeline for Ozon and one per Yandex.Market campaign
//! 7. Run all pipelines concurrently; SIGINT abandons the run
//! 8. Log per-target summaries; exit non-zero if a target could not run

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use futures_util::future::join_all;
use tokio::signal;
use tracing::{error, info, warn};

use marketplace_stock_sync::adapters::feeds::{MemoizedFeed, SupplierFeed};
use marketplace_stock_sync::adapters::http::{ApiClient, ApiClientConfig};
use marketplace_stock_sync::adapters::ozon::{OzonClient, OzonCredentials, OzonLimits};
use marketplace_stock_sync::adapters::yandex::{
    Campaign, MarketToken, YandexLimits, YandexMarketClient,
};
use marketplace_stock_sync::config::{self, AppConfig, OzonConfig, YandexConfig};
use marketplace_stock_sync::domain::Marketplace;
use marketplace_stock_sync::ports::marketplace::MarketplaceClient;
use marketplace_stock_sync::ports::reference_feed::ReferenceFeed;
use marketplace_stock_sync::usecases::{PipelineSettings, SyncPipeline};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. CLI arguments ─────────────────────────────────────
    let args = CliArgs::parse();

    // ── 2. Load configuration from config.toml ──────────────
    let mut config = config::loader::load_config(&args.config)
        .context("Failed to load configuration")?;
    if args.dry_run {
        config.sync.dry_run = true;
    }

    // ── 3. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.sync.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.sync.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.sync.dry_run,
        only = ?args.only,
        "Starting marketplace stock sync"
    );

    if config.sync.dry_run {
        warn!("Dry-run mode — plans computed but NO writes sent");
    }

    // ── 4. Supplier feed, shared across targets ─────────────
    let feed: Arc<dyn ReferenceFeed> = Arc::new(MemoizedFeed::new(
        SupplierFeed::from_config(&config.feed, Duration::from_secs(config.http.timeout_secs))
            .context("Failed to create supplier feed")?,
    ));
    let settings = PipelineSettings::from(&config.sync);

    // ── 5-6. Build pipelines from config + env credentials ──
    let mut unavailable = 0usize;

    let ozon = match config.ozon.as_ref().filter(|o| o.enabled && args.wants(Marketplace::Ozon)) {
        Some(ozon_config) => match build_ozon(&config, ozon_config, &feed, settings) {
            Ok(pipeline) => Some(pipeline),
            Err(e) => {
                error!(error = %format!("{e:#}"), "Ozon target unavailable");
                unavailable += 1;
                None
            }
        },
        None => None,
    };

    let mut yandex = Vec::new();
    if let Some(yandex_config) = config
        .yandex
        .as_ref()
        .filter(|y| y.enabled && args.wants(Marketplace::YandexMarket))
    {
        match build_yandex(&config, yandex_config, &feed, settings) {
            Ok(pipelines) => yandex = pipelines,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Yandex.Market targets unavailable");
                unavailable += yandex_config.campaigns.len();
            }
        }
    }

    let total = usize::from(ozon.is_some()) + yandex.len() + unavailable;
    anyhow::ensure!(total > 0, "No marketplace target selected");

    // ── 7. Run every pipeline; SIGINT abandons the run ──────
    let ozon_run = async {
        match &ozon {
            Some(pipeline) => vec![run_target(pipeline).await],
            None => Vec::new(),
        }
    };
    let yandex_runs = join_all(yandex.iter().map(run_target));

    let results = tokio::select! {
        (ozon_results, yandex_results) = async { tokio::join!(ozon_run, yandex_runs) } => {
            ozon_results.into_iter().chain(yandex_results).collect::<Vec<bool>>()
        }
        _ = signal::ctrl_c() => {
            warn!("SIGINT received, abandoning in-flight sync");
            anyhow::bail!("Sync interrupted");
        }
    };

    // ── 8. Exit status ───────────────────────────────────────
    let failed = unavailable + results.iter().filter(|ok| !**ok).count();
    info!(targets = total, failed, "Sync job finished");

    anyhow::ensure!(failed == 0, "{failed} of {total} targets could not be synced");
    Ok(())
}

/// Run one pipeline and log its outcome. Returns whether it ran.
async fn run_target<M: MarketplaceClient>(pipeline: &SyncPipeline<M>) -> bool {
    match pipeline.run().await {
        Ok(report) => {
            report.log();
            true
        }
        Err(e) => {
            error!(target = %pipeline.target(), error = %e, "Target could not be synced");
            false
        }
    }
}

fn build_ozon(
    config: &AppConfig,
    ozon: &OzonConfig,
    feed: &Arc<dyn ReferenceFeed>,
    settings: PipelineSettings,
) -> Result<SyncPipeline<OzonClient>> {
    let credentials =
        OzonCredentials::from_env().context("Failed to load Ozon credentials from env")?;
    let api = ApiClient::new(ApiClientConfig::from_http(&ozon.base_url, &config.http))
        .context("Failed to create Ozon HTTP client")?;
    let limits = OzonLimits {
        page_limit: ozon.page_limit,
        price_batch_size: ozon.price_batch_size,
        stock_batch_size: ozon.stock_batch_size,
    };
    let client = Arc::new(OzonClient::new(api, credentials, limits));

    Ok(SyncPipeline::new(
        client,
        Arc::clone(feed),
        ozon.policy.reconcile_options(),
        settings,
    ))
}

fn build_yandex(
    config: &AppConfig,
    yandex: &YandexConfig,
    feed: &Arc<dyn ReferenceFeed>,
    settings: PipelineSettings,
) -> Result<Vec<SyncPipeline<YandexMarketClient>>> {
    let token = MarketToken::from_env().context("Failed to load Yandex.Market token from env")?;
    let limits = YandexLimits {
        page_limit: yandex.page_limit,
        price_batch_size: yandex.price_batch_size,
        stock_batch_size: yandex.stock_batch_size,
    };

    yandex
        .campaigns
        .iter()
        .map(|c| {
            let api = ApiClient::new(ApiClientConfig::from_http(&yandex.base_url, &config.http))
                .with_context(|| format!("Failed to create HTTP client for campaign {}", c.name))?;
            let campaign = Campaign {
                name: c.name.clone(),
                campaign_id: c.campaign_id.clone(),
                warehouse_id: c.warehouse_id,
            };
            let client = Arc::new(YandexMarketClient::new(api, token.clone(), campaign, limits));
            Ok(SyncPipeline::new(
                client,
                Arc::clone(feed),
                yandex.policy.reconcile_options(),
                settings,
            ))
        })
        .collect()
}

/// Marketplace to restrict a run to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Ozon,
    #[value(alias = "yandex_market")]
    Yandex,
}

impl From<Target> for Marketplace {
    fn from(target: Target) -> Self {
        match target {
            Target::Ozon => Self::Ozon,
            Target::Yandex => Self::YandexMarket,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "marketplace-stock-sync",
    version,
    about = "Push supplier prices and stock to Ozon and Yandex.Market"
)]
struct CliArgs {
    /// Path to the TOML configuration file
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    /// Compute and log plans without sending writes
    #[arg(long)]
    dry_run: bool,
    /// Sync only one marketplace
    #[arg(long, value_enum)]
    only: Option<Target>,
}

impl CliArgs {
    fn wants(&self, marketplace: Marketplace) -> bool {
        self.only.is_none_or(|t| Marketplace::from(t) == marketplace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("marketplace-stock-sync").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.config, "config.toml");
        assert!(!args.dry_run);
        assert!(args.wants(Marketplace::Ozon));
        assert!(args.wants(Marketplace::YandexMarket));
    }

    #[test]
    fn test_only_and_dry_run() {
        let args = parse(&["prod.toml", "--dry-run", "--only", "yandex"]).unwrap();
        assert_eq!(args.config, "prod.toml");
        assert!(args.dry_run);
        assert!(!args.wants(Marketplace::Ozon));
        assert!(args.wants(Marketplace::YandexMarket));
    }

    #[test]
    fn test_yandex_market_alias() {
        let args = parse(&["--only", "yandex_market"]).unwrap();
        assert_eq!(args.only, Some(Target::Yandex));
    }

    #[test]
    fn test_rejects_unknown_input() {
        assert!(parse(&["--only", "wildberries"]).is_err());
        assert!(parse(&["--only"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }
}
