//! Update Dispatcher - Batched Price/Stock Writes
//!
//! Sends a reconciliation plan to one marketplace target:
//! - Price writes and stock writes run as two concurrent streams
//! - Each stream is split into the client's batch size
//! - Batches within a stream run with bounded concurrency
//! - A failed batch fails only its own offers; the run continues

use std::fmt;
use std::sync::Arc;

use futures_util::StreamExt;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::catalog::{OfferId, UpdateInstruction};
use crate::domain::reconcile::ReconciliationPlan;
use crate::ports::marketplace::{ItemOutcome, MarketplaceClient};

/// Which write stream an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStream {
  Price,
  Stock,
}

impl fmt::Display for UpdateStream {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Price => write!(f, "price"),
      Self::Stock => write!(f, "stock"),
    }
  }
}

/// Per-stream tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamCounts {
  pub succeeded: usize,
  pub failed: usize,
}

impl StreamCounts {
  fn record(&mut self, outcome: &ItemOutcome) {
    if outcome.is_accepted() {
      self.succeeded += 1;
    } else {
      self.failed += 1;
    }
  }
}

/// A write that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
  pub offer_id: OfferId,
  pub stream: UpdateStream,
  pub reason: String,
}

/// End-of-dispatch summary for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
  /// Price write tallies.
  pub prices: StreamCounts,
  /// Stock write tallies.
  pub stocks: StreamCounts,
  /// Every failed write with its reason.
  pub failures: Vec<FailedItem>,
  /// Offers published with a positive stock.
  pub in_stock: usize,
  /// Nothing was sent.
  pub dry_run: bool,
}

impl DispatchSummary {
  /// Total accepted writes across both streams.
  pub fn succeeded(&self) -> usize {
    self.prices.succeeded + self.stocks.succeeded
  }

  /// Total failed writes across both streams.
  pub fn failed(&self) -> usize {
    self.prices.failed + self.stocks.failed
  }

  fn absorb(&mut self, stream: UpdateStream, outcomes: Vec<ItemOutcome>) {
    for outcome in outcomes {
      match stream {
        UpdateStream::Price => self.prices.record(&outcome),
        UpdateStream::Stock => self.stocks.record(&outcome),
      }
      if let Some(reason) = outcome.error {
        self.failures.push(FailedItem {
          offer_id: outcome.offer_id,
          stream,
          reason,
        });
      }
    }
  }
}

/// Sends plans to a marketplace client.
pub struct UpdateDispatcher<M: MarketplaceClient> {
  /// Marketplace port.
  client: Arc<M>,
  /// Concurrent batches per stream.
  max_in_flight: usize,
  /// Log instead of sending.
  dry_run: bool,
}

impl<M: MarketplaceClient> UpdateDispatcher<M> {
  /// Create a new dispatcher.
  pub fn new(client: Arc<M>, max_in_flight: usize, dry_run: bool) -> Self {
    Self {
      client,
      max_in_flight: max_in_flight.max(1),
      dry_run,
    }
  }

  /// Send every write in the plan and report what happened.
  ///
  /// Never fails: transport errors and marketplace rejections are
  /// recorded per offer in the summary.
  #[instrument(skip(self, plan), fields(target = %self.client.target(), writes = plan.instructions.len()))]
  pub async fn dispatch(&self, plan: &ReconciliationPlan) -> DispatchSummary {
    let prices: Vec<UpdateInstruction> = plan.price_updates().cloned().collect();
    let stocks = plan.instructions.as_slice();

    let mut summary = DispatchSummary {
      in_stock: stocks.iter().filter(|i| i.stock > 0).count(),
      dry_run: self.dry_run,
      ..DispatchSummary::default()
    };

    if self.dry_run {
      for instruction in stocks {
        debug!(
          offer_id = %instruction.offer_id,
          price = ?instruction.price,
          stock = instruction.stock,
          "Dry run, not sending"
        );
      }
      info!(
        price_writes = prices.len(),
        stock_writes = stocks.len(),
        in_stock = summary.in_stock,
        "Dry run complete - no writes sent"
      );
      return summary;
    }

    let (price_batches, stock_batches) = tokio::join!(
      self.run_stream(UpdateStream::Price, &prices),
      self.run_stream(UpdateStream::Stock, stocks),
    );

    for outcomes in price_batches {
      summary.absorb(UpdateStream::Price, outcomes);
    }
    for outcomes in stock_batches {
      summary.absorb(UpdateStream::Stock, outcomes);
    }

    info!(
      prices_ok = summary.prices.succeeded,
      prices_failed = summary.prices.failed,
      stocks_ok = summary.stocks.succeeded,
      stocks_failed = summary.stocks.failed,
      in_stock = summary.in_stock,
      "Dispatch complete"
    );

    summary
  }

  /// Run one stream; one result slot per batch.
  async fn run_stream(
    &self,
    stream: UpdateStream,
    items: &[UpdateInstruction],
  ) -> Vec<Vec<ItemOutcome>> {
    let batch_size = match stream {
      UpdateStream::Price => self.client.price_batch_size(),
      UpdateStream::Stock => self.client.stock_batch_size(),
    }
    .max(1);

    futures_util::stream::iter(items.chunks(batch_size).enumerate())
      .map(|(index, batch)| self.send_batch(stream, index, batch))
      .buffer_unordered(self.max_in_flight)
      .collect()
      .await
  }

  async fn send_batch(
    &self,
    stream: UpdateStream,
    index: usize,
    batch: &[UpdateInstruction],
  ) -> Vec<ItemOutcome> {
    let result = match stream {
      UpdateStream::Price => self.client.update_prices(batch).await,
      UpdateStream::Stock => self.client.update_stocks(batch).await,
    };

    match result {
      Ok(outcomes) => {
        debug!(%stream, batch = index, size = batch.len(), "Batch sent");
        outcomes
      }
      Err(e) => {
        warn!(
          %stream,
          batch = index,
          size = batch.len(),
          kind = e.kind(),
          error = %e,
          "Batch failed"
        );
        let reason = e.to_string();
        batch
          .iter()
          .map(|i| ItemOutcome::rejected(&i.offer_id, reason.clone()))
          .collect()
      }
    }
  }
}
