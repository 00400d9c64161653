//! Tiki API client

use async_trait::async_trait;
use marketline_core::normalize::{id_string, lookup};
use marketline_core::{
    ApiClient, ApiRequest, FetchError, ItemStub, Marketplace, ProductRecord, RawProduct,
    RecordSchema, ShopContext, SourceAdapter,
};
use serde_json::Value;

use crate::config::Config;
use crate::transform;

/// Tiki seller-store adapter
#[derive(Debug, Clone)]
pub struct TikiAdapter {
    client: ApiClient,
    config: Config,
}

impl TikiAdapter {
    pub fn new(client: ApiClient, config: Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `GET {api}/v2/seller/stores/{slug}/products?limit=&page=`
    pub fn listing_request(&self, slug: &str, page: u32) -> ApiRequest {
        let base = self.config.api_base.trim_end_matches('/');
        ApiRequest::get(format!("{base}/v2/seller/stores/{slug}/products"))
            .query("limit", self.config.page_size)
            .query("page", page)
    }

    /// `GET {web}/api/v2/products/{id}?platform=web[&spid=]`
    ///
    /// `spid` pins the offer of this store when the listing row names one.
    pub fn detail_request(&self, stub: &ItemStub) -> ApiRequest {
        let base = self.config.web_base.trim_end_matches('/');
        let req = ApiRequest::get(format!("{base}/api/v2/products/{}", stub.id))
            .query("platform", "web");
        match lookup(&stub.hint, "seller_product_id").and_then(id_string) {
            Some(spid) => req.query("spid", spid),
            None => req,
        }
    }
}

/// Listing rows from a `{data: [...]}` page body.
pub fn parse_listing(body: &Value) -> Result<Vec<ItemStub>, FetchError> {
    let data = body.get("data").ok_or_else(|| FetchError::missing("data"))?;
    let rows = data
        .as_array()
        .ok_or_else(|| FetchError::Malformed("'data' is not an array".to_string()))?;
    rows.iter()
        .map(|row| {
            let id = row
                .get("id")
                .and_then(id_string)
                .ok_or_else(|| FetchError::missing("data[].id"))?;
            Ok(ItemStub::new(id, row.clone()))
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for TikiAdapter {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Tiki
    }

    fn page_size(&self) -> u32 {
        self.config.page_size
    }

    fn schema(&self) -> &'static RecordSchema {
        &transform::SCHEMA
    }

    async fn list_page(&self, shop: &ShopContext, page: u32) -> Result<Vec<ItemStub>, FetchError> {
        let body = self
            .client
            .get_json(self.listing_request(shop.slug(), page))
            .await?;
        let stubs = parse_listing(&body)?;
        log::debug!("{}: page {page}, {} items", shop.seller, stubs.len());
        Ok(stubs)
    }

    async fn fetch_detail(
        &self,
        _shop: &ShopContext,
        stub: &ItemStub,
    ) -> Result<Value, FetchError> {
        self.client.get_json(self.detail_request(stub)).await
    }

    fn normalize(&self, raw: &RawProduct) -> Result<ProductRecord, FetchError> {
        transform::normalize(raw)
    }
}
