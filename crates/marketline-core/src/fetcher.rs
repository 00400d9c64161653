//! Per-item detail and variant fetching

use std::future::Future;

use futures_util::future::try_join_all;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::limiter::ConcurrencyLimiter;
use crate::record::{FailedRecord, ProductRecord, RecordEntry};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::source::{ItemStub, RawProduct, ShopContext, SourceAdapter};

/// Shared machinery every detail/variant request goes through.
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
    pub limiter: &'a ConcurrencyLimiter,
    pub policy: &'a RetryPolicy,
    pub cancel: &'a CancellationToken,
}

/// One request: retried with backoff, each attempt admitted by the limiter.
///
/// The permit covers a single attempt, so backoff sleeps and child requests
/// never hold a slot.
async fn gated<T, F, Fut>(ctx: FetchContext<'_>, label: &str, mut request: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    retry_with_backoff(label, ctx.policy, ctx.cancel, || {
        let attempt = request();
        async move {
            ctx.limiter
                .run(async move {
                    tokio::select! {
                        _ = ctx.cancel.cancelled() => Err(FetchError::Cancelled),
                        r = attempt => r,
                    }
                })
                .await
        }
    })
    .await
}

/// Fetch the detail of `stub`, expand its variants and normalize.
///
/// Variant requests are issued after the detail request has released its
/// slot and go through the same limiter concurrently. Any variant failing
/// after retries fails the item.
pub async fn fetch_item(
    adapter: &dyn SourceAdapter,
    shop: &ShopContext,
    stub: &ItemStub,
    ctx: FetchContext<'_>,
) -> Result<ProductRecord, FetchError> {
    let label = format!("{} item {}", shop.seller, stub.id);
    let detail = gated(ctx, &label, || adapter.fetch_detail(shop, stub)).await?;

    let variant_ids = adapter.variant_ids(&detail);
    let variants = if variant_ids.is_empty() {
        Vec::new()
    } else {
        log::trace!("{label}: {} variants to expand", variant_ids.len());
        try_join_all(variant_ids.iter().map(|vid| {
            let label = format!("{label} variant {vid}");
            async move { gated(ctx, &label, || adapter.fetch_variant(shop, stub, vid)).await }
        }))
        .await?
    };

    let record = adapter.normalize(&RawProduct {
        hint: stub.hint.clone(),
        detail,
        variants,
    })?;
    if !adapter.schema().conforms(&record) {
        return Err(FetchError::Malformed(format!(
            "normalized record does not match the {} schema",
            adapter.marketplace()
        )));
    }
    Ok(record)
}

/// [`fetch_item`], demoting errors to a [`FailedRecord`].
pub async fn fetch_entry(
    adapter: &dyn SourceAdapter,
    shop: &ShopContext,
    stub: &ItemStub,
    ctx: FetchContext<'_>,
) -> RecordEntry {
    match fetch_item(adapter, shop, stub, ctx).await {
        Ok(record) => RecordEntry::Ok(record),
        Err(FetchError::Cancelled) => {
            RecordEntry::Failed(FailedRecord::new(&stub.id, &FetchError::Cancelled))
        }
        Err(e) => {
            log::warn!("{} item {}: {e}", shop.seller, stub.id);
            RecordEntry::Failed(FailedRecord::new(&stub.id, &e))
        }
    }
}
