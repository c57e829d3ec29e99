//! Sync Pipeline - One Fetch/Reconcile/Dispatch Run per Target
//!
//! For a single marketplace target:
//! 1. Fetch the seller catalog and the supplier list concurrently
//! 2. Reconcile them into a plan of writes
//! 3. Dispatch the plan in batches
//!
//! Fetching and reconciling are bounded by the run timeout. Dispatch is
//! bounded per request by the HTTP client, so a slow write phase still
//! ends in a full summary. A failed fetch or a malformed record stops
//! this target only.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::dispatcher::{DispatchSummary, UpdateDispatcher};
use crate::config::SyncConfig;
use crate::domain::catalog::Marketplace;
use crate::domain::reconcile::{MatchingError, ReconcileOptions, ReconciliationPlan, Reconciler};
use crate::ports::marketplace::{MarketplaceClient, MarketplaceError};
use crate::ports::reference_feed::{FeedError, ReferenceFeed};

/// Why a target could not be synced.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error("catalog fetch failed: {0}")]
  Catalog(MarketplaceError),
  #[error("supplier feed failed: {0}")]
  Feed(FeedError),
  #[error("reconciliation aborted: {0}")]
  Matching(#[from] MatchingError),
  #[error("fetch and reconcile exceeded {0:?}")]
  TimedOut(Duration),
}

/// Run-level settings shared by all targets.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
  /// Concurrent write batches per stream.
  pub max_in_flight: usize,
  /// Compute the plan, send nothing.
  pub dry_run: bool,
  /// Upper bound for fetching and reconciling.
  pub run_timeout: Duration,
}

impl Default for PipelineSettings {
  fn default() -> Self {
    Self {
      max_in_flight: 4,
      dry_run: false,
      run_timeout: Duration::from_secs(600),
    }
  }
}

impl From<&SyncConfig> for PipelineSettings {
  fn from(config: &SyncConfig) -> Self {
    Self {
      max_in_flight: config.max_in_flight,
      dry_run: config.dry_run,
      run_timeout: config.run_timeout(),
    }
  }
}

/// Outcome of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub run_id: Uuid,
  pub marketplace: Marketplace,
  pub target: String,
  /// Offers listed on the marketplace.
  pub catalog_items: usize,
  /// Rows read from the supplier list.
  pub reference_items: usize,
  /// Writes in the plan.
  pub planned: usize,
  pub unchanged: usize,
  pub unmatched_catalog: usize,
  pub unmatched_reference: usize,
  pub zeroed: usize,
  pub dispatch: DispatchSummary,
  pub elapsed_ms: u64,
}

impl RunReport {
  /// Whether every planned write was accepted.
  pub fn is_clean(&self) -> bool {
    self.dispatch.failed() == 0
  }

  /// Emit the end-of-run summary. The `report` field carries the
  /// whole report as JSON.
  pub fn log(&self) {
    let report = serde_json::to_string(self).unwrap_or_default();
    info!(
      run_id = %self.run_id,
      target = %self.target,
      planned = self.planned,
      updated = self.dispatch.succeeded(),
      failed = self.dispatch.failed(),
      dry_run = self.dispatch.dry_run,
      elapsed_ms = self.elapsed_ms,
      report = %report,
      "Sync run finished"
    );
    for failure in &self.dispatch.failures {
      warn!(
        target = %self.target,
        offer_id = %failure.offer_id,
        stream = %failure.stream,
        reason = %failure.reason,
        "Write failed"
      );
    }
  }
}

/// Sync pipeline for one marketplace target.
pub struct SyncPipeline<M: MarketplaceClient> {
  /// Marketplace port.
  client: Arc<M>,
  /// Supplier data port, possibly shared with other targets.
  feed: Arc<dyn ReferenceFeed>,
  /// Diff engine with this target's policy.
  reconciler: Reconciler,
  /// Batched writer.
  dispatcher: UpdateDispatcher<M>,
  /// Deadline for fetch and reconcile.
  run_timeout: Duration,
}

impl<M: MarketplaceClient> SyncPipeline<M> {
  /// Wire a pipeline for one target.
  pub fn new(
    client: Arc<M>,
    feed: Arc<dyn ReferenceFeed>,
    options: ReconcileOptions,
    settings: PipelineSettings,
  ) -> Self {
    let dispatcher =
      UpdateDispatcher::new(Arc::clone(&client), settings.max_in_flight, settings.dry_run);
    Self {
      client,
      feed,
      reconciler: Reconciler::new(options),
      dispatcher,
      run_timeout: settings.run_timeout,
    }
  }

  /// Target label of the underlying client.
  pub fn target(&self) -> String {
    self.client.target()
  }

  /// Run fetch, reconcile and dispatch once.
  ///
  /// # Errors
  /// [`SyncError`] when the catalog or feed cannot be fetched, a record
  /// is malformed, or fetching and reconciling exceed the run timeout.
  /// Individual write failures are reported in [`RunReport::dispatch`]
  /// instead.
  pub async fn run(&self) -> Result<RunReport, SyncError> {
    let run_id = Uuid::new_v4();
    let span = info_span!(
      "sync_run",
      run_id = %run_id,
      marketplace = %self.client.marketplace(),
      target = %self.client.target(),
    );

    async {
      let result = self.execute(run_id).await;
      if let Err(e) = &result {
        error!(error = %e, "Sync run failed");
      }
      result
    }
    .instrument(span)
    .await
  }

  async fn execute(&self, run_id: Uuid) -> Result<RunReport, SyncError> {
    let started = Instant::now();

    let (catalog_items, reference_items, plan) =
      tokio::time::timeout(self.run_timeout, self.plan())
        .await
        .map_err(|_| SyncError::TimedOut(self.run_timeout))??;

    let dispatch = self.dispatcher.dispatch(&plan).await;

    Ok(RunReport {
      run_id,
      marketplace: self.client.marketplace(),
      target: self.client.target(),
      catalog_items,
      reference_items,
      planned: plan.instructions.len(),
      unchanged: plan.unchanged,
      unmatched_catalog: plan.unmatched_catalog,
      unmatched_reference: plan.unmatched_reference,
      zeroed: plan.zeroed,
      dispatch,
      elapsed_ms: started.elapsed().as_millis() as u64,
    })
  }

  /// Fetch both sides and reconcile them. Returns the catalog size, the
  /// supplier list size and the plan.
  async fn plan(&self) -> Result<(usize, usize, ReconciliationPlan), SyncError> {
    info!("Fetching catalog and supplier list");

    let (catalog, reference) = tokio::try_join!(
      async { self.client.list_products().await.map_err(SyncError::Catalog) },
      async { self.feed.load_reference_items().await.map_err(SyncError::Feed) },
    )?;

    let plan = self.reconciler.reconcile(&catalog, &reference)?;
    info!(
      catalog = catalog.len(),
      supplier = reference.len(),
      writes = plan.instructions.len(),
      unchanged = plan.unchanged,
      unmatched_catalog = plan.unmatched_catalog,
      unmatched_supplier = plan.unmatched_reference,
      "Plan computed"
    );

    Ok((catalog.len(), reference.len(), plan))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::usecases::dispatcher::{FailedItem, StreamCounts, UpdateStream};

  #[test]
  fn test_report_serializes_dispatch_summary() {
    let report = RunReport {
      run_id: Uuid::nil(),
      marketplace: Marketplace::YandexMarket,
      target: "yandex:FBS:1".to_string(),
      catalog_items: 3,
      reference_items: 4,
      planned: 3,
      unchanged: 0,
      unmatched_catalog: 0,
      unmatched_reference: 1,
      zeroed: 0,
      dispatch: DispatchSummary {
        prices: StreamCounts {
          succeeded: 2,
          failed: 1,
        },
        stocks: StreamCounts {
          succeeded: 3,
          failed: 0,
        },
        failures: vec![FailedItem {
          offer_id: "C".to_string(),
          stream: UpdateStream::Price,
          reason: "timeout".to_string(),
        }],
        in_stock: 2,
        dry_run: false,
      },
      elapsed_ms: 12,
    };

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["marketplace"], "yandex_market");
    assert_eq!(json["run_id"], "00000000-0000-0000-0000-000000000000");
    assert_eq!(json["dispatch"]["prices"]["succeeded"], 2);
    assert_eq!(json["dispatch"]["prices"]["failed"], 1);
    assert_eq!(json["dispatch"]["failures"][0]["offer_id"], "C");
    assert_eq!(json["dispatch"]["failures"][0]["stream"], "price");
    assert_eq!(json["dispatch"]["in_stock"], 2);
    assert!(!report.is_clean());
  }
}
