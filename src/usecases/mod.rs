//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the sync job's workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `SyncPipeline`: fetch, reconcile and dispatch for one target
//! - `UpdateDispatcher`: batched, failure-isolated price/stock writes

pub mod dispatcher;
pub mod sync_run;

pub use dispatcher::{DispatchSummary, FailedItem, StreamCounts, UpdateDispatcher, UpdateStream};
pub use sync_run::{PipelineSettings, RunReport, SyncError, SyncPipeline};
