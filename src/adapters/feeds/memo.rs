//! Memoized Feed - One Download per Run
//!
//! Several marketplace targets are synced against the same supplier
//! list. Wrapping the feed in `MemoizedFeed` makes the first caller
//! download it and every later caller reuse the parsed rows. A failed
//! load is not cached, so the next caller tries again.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::domain::catalog::ReferenceItem;
use crate::ports::reference_feed::{FeedError, ReferenceFeed};

/// Caches the first successful load of an inner feed.
pub struct MemoizedFeed<F> {
    inner: F,
    rows: OnceCell<Arc<Vec<ReferenceItem>>>,
}

impl<F: ReferenceFeed> MemoizedFeed<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            rows: OnceCell::new(),
        }
    }

    /// Whether a successful load has been cached.
    pub fn is_loaded(&self) -> bool {
        self.rows.initialized()
    }
}

#[async_trait]
impl<F: ReferenceFeed> ReferenceFeed for MemoizedFeed<F> {
    async fn load_reference_items(&self) -> Result<Vec<ReferenceItem>, FeedError> {
        if self.rows.initialized() {
            debug!("Reusing cached supplier feed");
        }
        let rows = self
            .rows
            .get_or_try_init(|| async {
                self.inner.load_reference_items().await.map(Arc::new)
            })
            .await?;
        Ok(rows.as_ref().clone())
    }
}
