//! Crawl targets and the per-marketplace adapter interface

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::record::{ProductRecord, RecordSchema};

/// Supported marketplaces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Tiki,
    Shopee,
    Lazada,
}

impl Marketplace {
    pub const ALL: [Marketplace; 3] = [Self::Tiki, Self::Shopee, Self::Lazada];

    /// Parse CLI/config string into enum
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tiki" => Some(Self::Tiki),
            "shopee" => Some(Self::Shopee),
            "lazada" => Some(Self::Lazada),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Tiki => "tiki",
            Self::Shopee => "shopee",
            Self::Lazada => "lazada",
        }
    }
}

impl std::fmt::Display for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One crawl target: a merchant account on a marketplace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Seller {
    pub marketplace: Marketplace,
    pub slug: String,
}

impl Seller {
    pub fn new(marketplace: Marketplace, slug: impl Into<String>) -> Self {
        Self {
            marketplace,
            slug: slug.into(),
        }
    }
}

impl std::fmt::Display for Seller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.marketplace, self.slug)
    }
}

/// Seller plus whatever the adapter resolved for it before crawling.
///
/// Built once per seller by [`SourceAdapter::resolve_shop`] and borrowed by
/// every listing and detail call of that seller's crawl.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopContext {
    pub seller: Seller,
    pub shop_id: Option<String>,
}

impl ShopContext {
    /// Context for marketplaces keyed by slug alone.
    pub fn unresolved(seller: &Seller) -> Self {
        Self {
            seller: seller.clone(),
            shop_id: None,
        }
    }

    pub fn slug(&self) -> &str {
        &self.seller.slug
    }

    /// Resolved shop id; adapters that list by shop id call this.
    pub fn require_shop_id(&self) -> Result<&str, FetchError> {
        self.shop_id
            .as_deref()
            .ok_or_else(|| FetchError::ShopResolution {
                slug: self.seller.slug.clone(),
                reason: "shop id not resolved".to_string(),
            })
    }
}

/// Listing-derived reference to one product.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemStub {
    pub id: String,
    /// The raw listing row, kept for adapters that need listing-only fields
    pub hint: Value,
}

impl ItemStub {
    pub fn new(id: impl Into<String>, hint: Value) -> Self {
        Self {
            id: id.into(),
            hint,
        }
    }
}

/// Everything fetched for one item, ready for normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct RawProduct {
    pub hint: Value,
    pub detail: Value,
    /// One payload per variant id, in the order the detail listed them
    pub variants: Vec<Value>,
}

/// Capability interface implemented once per marketplace.
///
/// Every network method performs a single attempt; the engine adds retries,
/// admission control and cancellation around them.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn marketplace(&self) -> Marketplace;

    /// Items requested per listing page
    fn page_size(&self) -> u32;

    /// Pause between consecutive listing requests of one seller
    fn pagination_delay(&self) -> Duration {
        Duration::ZERO
    }

    /// Canonical field set of this marketplace's records
    fn schema(&self) -> &'static RecordSchema;

    /// Look up ids the marketplace needs before listing. Called once per seller.
    async fn resolve_shop(&self, seller: &Seller) -> Result<ShopContext, FetchError> {
        Ok(ShopContext::unresolved(seller))
    }

    /// Fetch one listing page (1-based). An empty vec means the listing is exhausted.
    async fn list_page(&self, shop: &ShopContext, page: u32) -> Result<Vec<ItemStub>, FetchError>;

    async fn fetch_detail(&self, shop: &ShopContext, stub: &ItemStub)
        -> Result<Value, FetchError>;

    /// Variant ids whose pricing needs a request of its own (empty for inline variants)
    fn variant_ids(&self, _detail: &Value) -> Vec<String> {
        Vec::new()
    }

    async fn fetch_variant(
        &self,
        _shop: &ShopContext,
        _stub: &ItemStub,
        variant_id: &str,
    ) -> Result<Value, FetchError> {
        Err(FetchError::Malformed(format!(
            "{} has no per-variant endpoint (variant {variant_id})",
            self.marketplace()
        )))
    }

    /// Map raw payloads onto [`Self::schema`]. Must be pure.
    fn normalize(&self, raw: &RawProduct) -> Result<ProductRecord, FetchError>;
}
