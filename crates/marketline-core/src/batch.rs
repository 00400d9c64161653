//! Batch assembly: drives crawl → fetch → normalize per seller

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::crawler::crawl;
use crate::error::FetchError;
use crate::fetcher::{FetchContext, fetch_entry};
use crate::limiter::ConcurrencyLimiter;
use crate::progress::{ProgressContext, SharedProgress, fmt_num};
use crate::record::RecordEntry;
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::source::{Marketplace, Seller, SourceAdapter};

/// Snapshot of one seller's catalog, every record carrying `batched_at`.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub marketplace: Marketplace,
    pub seller: String,
    pub batched_at: DateTime<Utc>,
    pub records: Vec<RecordEntry>,
}

impl Batch {
    pub fn ok_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.records.len() - self.ok_count()
    }
}

/// One crawl target with the adapter that knows its marketplace.
#[derive(Clone)]
pub struct HarvestTarget {
    pub adapter: Arc<dyn SourceAdapter>,
    pub seller: Seller,
}

impl std::fmt::Debug for HarvestTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestTarget")
            .field("seller", &self.seller)
            .finish_non_exhaustive()
    }
}

/// Result for one seller: its batch, or why the whole batch was aborted.
#[derive(Debug)]
pub struct SellerOutcome {
    pub seller: Seller,
    pub result: Result<Batch, FetchError>,
    pub elapsed: Duration,
}

/// Drives every target of a run against one shared limiter.
pub struct Harvester {
    limiter: Arc<ConcurrencyLimiter>,
    retry: RetryPolicy,
    seller_concurrency: usize,
    cancel: CancellationToken,
    progress: SharedProgress,
}

impl Harvester {
    pub const DEFAULT_SELLER_CONCURRENCY: usize = 4;

    pub fn new(limiter: Arc<ConcurrencyLimiter>, retry: RetryPolicy) -> Self {
        Self {
            limiter,
            retry,
            seller_concurrency: Self::DEFAULT_SELLER_CONCURRENCY,
            cancel: CancellationToken::new(),
            progress: Arc::new(ProgressContext::hidden()),
        }
    }

    /// Sellers crawled at the same time (minimum 1)
    pub fn with_seller_concurrency(mut self, n: usize) -> Self {
        self.seller_concurrency = n.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Harvest all targets; one outcome per target, in target order.
    ///
    /// `batched_at` is stamped on every record of every batch of this call.
    pub async fn harvest(
        &self,
        targets: &[HarvestTarget],
        batched_at: DateTime<Utc>,
    ) -> Vec<SellerOutcome> {
        // Close the limiter on cancellation so queued requests stop waiting
        let closer = {
            let cancel = self.cancel.clone();
            let limiter = self.limiter.clone();
            tokio::spawn(async move {
                cancel.cancelled().await;
                limiter.close();
            })
        };

        let outcomes = stream::iter(targets)
            .map(|target| async move {
                let start = Instant::now();
                let result = self
                    .harvest_seller(target.adapter.as_ref(), &target.seller, batched_at)
                    .await;
                if let Err(e) = &result {
                    log::error!("{}: batch aborted: {e}", target.seller);
                }
                SellerOutcome {
                    seller: target.seller.clone(),
                    result,
                    elapsed: start.elapsed(),
                }
            })
            .buffered(self.seller_concurrency)
            .collect::<Vec<_>>()
            .await;

        closer.abort();
        outcomes
    }

    /// Resolve, crawl and fetch one seller.
    pub async fn harvest_seller(
        &self,
        adapter: &dyn SourceAdapter,
        seller: &Seller,
        batched_at: DateTime<Utc>,
    ) -> Result<Batch, FetchError> {
        let pb = self.progress.seller_bar(&seller.to_string());
        let result = self.run_seller(adapter, seller, batched_at, &pb).await;
        pb.finish_and_clear();
        result
    }

    async fn run_seller(
        &self,
        adapter: &dyn SourceAdapter,
        seller: &Seller,
        batched_at: DateTime<Utc>,
        pb: &indicatif::ProgressBar,
    ) -> Result<Batch, FetchError> {
        log::info!("{seller}: starting");

        pb.set_message("resolving shop...");
        let shop = retry_with_backoff(
            &format!("{seller} shop lookup"),
            &self.retry,
            &self.cancel,
            || adapter.resolve_shop(seller),
        )
        .await
        .map_err(|e| match e {
            FetchError::ShopResolution { .. } | FetchError::Cancelled => e,
            other => FetchError::ShopResolution {
                slug: seller.slug.clone(),
                reason: other.to_string(),
            },
        })?;
        if let Some(id) = &shop.shop_id {
            log::debug!("{seller}: shop id {id}");
        }

        pb.set_message("listing...");
        let stubs = crawl(adapter, &shop, &self.retry, &self.cancel, pb).await?;
        let total = stubs.len();
        log::info!("{seller}: {} items listed", fmt_num(total));

        let ctx = FetchContext {
            limiter: &self.limiter,
            policy: &self.retry,
            cancel: &self.cancel,
        };
        let done = AtomicUsize::new(0);
        let window = self.limiter.capacity() * 2;
        let shop = &shop;
        let done = &done;

        let mut records: Vec<RecordEntry> = stream::iter(&stubs)
            .map(|stub| async move {
                let entry = fetch_entry(adapter, shop, stub, ctx).await;
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                pb.set_message(format!("details {n}/{total}"));
                entry
            })
            .buffered(window)
            .collect()
            .await;

        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        for record in &mut records {
            record.stamp(batched_at);
        }

        let batch = Batch {
            marketplace: seller.marketplace,
            seller: seller.slug.clone(),
            batched_at,
            records,
        };
        log::info!(
            "{seller}: {} records, {} failed",
            fmt_num(batch.ok_count()),
            fmt_num(batch.failed_count())
        );
        Ok(batch)
    }
}

/// Totals across a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    pub sellers: usize,
    pub sellers_failed: usize,
    pub records: usize,
    pub records_failed: usize,
}

impl HarvestSummary {
    pub fn from_outcomes(outcomes: &[SellerOutcome]) -> Self {
        let mut summary = Self {
            sellers: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match &outcome.result {
                Ok(batch) => {
                    summary.records += batch.ok_count();
                    summary.records_failed += batch.failed_count();
                }
                Err(_) => summary.sellers_failed += 1,
            }
        }
        summary
    }

    /// Log summary lines (non-TTY mode)
    pub fn log(&self) {
        log::info!("=== Harvest Summary ===");
        log::info!(
            "Sellers: {}/{} completed ({} failed)",
            self.sellers - self.sellers_failed,
            self.sellers,
            self.sellers_failed
        );
        log::info!(
            "Records: {} ({} failed)",
            fmt_num(self.records),
            fmt_num(self.records_failed)
        );
    }
}
