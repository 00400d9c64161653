//! Sequential listing traversal for one seller

use indicatif::ProgressBar;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::source::{ItemStub, ShopContext, SourceAdapter};

/// Request listing pages 1, 2, ... until one comes back empty.
///
/// An empty page is the only termination signal. Page N+1 is requested only
/// after page N succeeded, with the adapter's pagination delay in between. A
/// page that still fails after retries fails the whole crawl; stubs from
/// earlier pages are dropped with it.
pub async fn crawl(
    adapter: &dyn SourceAdapter,
    shop: &ShopContext,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    pb: &ProgressBar,
) -> Result<Vec<ItemStub>, FetchError> {
    let delay = adapter.pagination_delay();
    let mut stubs = Vec::new();
    let mut page = 1u32;

    loop {
        if page > 1 && !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let label = format!("{} page {page}", shop.seller);
        let items = retry_with_backoff(&label, policy, cancel, || async {
            tokio::select! {
                _ = cancel.cancelled() => Err(FetchError::Cancelled),
                r = adapter.list_page(shop, page) => r,
            }
        })
        .await?;

        if items.is_empty() {
            log::debug!("{}: page {page} empty, listing complete", shop.seller);
            break;
        }

        log::debug!("{}: page {page} -> {} items", shop.seller, items.len());
        stubs.extend(items);
        pb.set_message(format!("page {page} · {} items", stubs.len()));
        page += 1;
    }

    Ok(stubs)
}
