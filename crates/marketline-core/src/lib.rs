//! Marketline Core - Common infrastructure for marketplace catalog harvesting
//!
//! This crate provides the harvest engine (pagination crawler, detail
//! fetcher, batch assembly), the shared concurrency limiter, the canonical
//! record model, and the transport/identity/output plumbing that the
//! per-marketplace adapter crates build on.

pub mod batch;
pub mod crawler;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod identity;
pub mod limiter;
pub mod logging;
pub mod normalize;
pub mod progress;
pub mod record;
pub mod retry;
pub mod shutdown;
pub mod sink;
pub mod source;

// Re-exports for convenience
pub use batch::{Batch, HarvestSummary, HarvestTarget, Harvester, SellerOutcome};
pub use crawler::crawl;
pub use error::{ErrorKind, FetchError};
pub use fetcher::{FetchContext, fetch_entry, fetch_item};
pub use http::{ApiClient, ApiRequest, FnTransport, HttpConfig, ReqwestTransport, Transport};
pub use identity::{IdentityProvider, RotatingIdentity, StaticIdentity};
pub use limiter::ConcurrencyLimiter;
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use record::{FailedRecord, ProductRecord, RecordEntry, RecordSchema, VariantRecord};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use shutdown::{CANCELLED_EXIT_CODE, install_signal_handler};
pub use sink::{JsonSink, cleanup_tmp_files};
pub use source::{ItemStub, Marketplace, RawProduct, Seller, ShopContext, SourceAdapter};
