//! Lazada API client

use std::time::Duration;

use async_trait::async_trait;
use marketline_core::normalize::{id_string, lookup, take_data};
use marketline_core::{
    ApiClient, ApiRequest, FetchError, ItemStub, Marketplace, ProductRecord, RawProduct,
    RecordSchema, Seller, ShopContext, SourceAdapter,
};
use serde_json::Value;

use crate::config::Config;
use crate::transform;

/// Lazada store adapter
#[derive(Debug, Clone)]
pub struct LazadaAdapter {
    client: ApiClient,
    config: Config,
}

impl LazadaAdapter {
    pub fn new(client: ApiClient, config: Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn www(&self) -> &str {
        self.config.www_base.trim_end_matches('/')
    }

    pub fn shop_request(&self, slug: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/shop/api/info", self.www())).query("shopName", slug)
    }

    /// Store listing page in its JSON (`ajax`) form
    pub fn listing_request(&self, slug: &str, page: u32) -> ApiRequest {
        ApiRequest::get(format!("{}/{slug}/", self.www()))
            .query("ajax", "true")
            .query("from", "wangpu")
            .query("page", page)
            .query("limit", self.config.page_size)
    }

    /// Item detail; with `sku_id`, the payload of that one SKU
    pub fn detail_request(&self, seller_id: &str, item_id: &str, sku_id: Option<&str>) -> ApiRequest {
        let base = self.config.pdp_base.trim_end_matches('/');
        let req = ApiRequest::get(format!("{base}/pdp/item"))
            .query("itemId", item_id)
            .query("sellerId", seller_id);
        match sku_id {
            Some(sku) => req.query("skuId", sku),
            None => req,
        }
    }
}

pub fn parse_seller_id(slug: &str, body: &Value) -> Result<String, FetchError> {
    lookup(body, "data.sellerId")
        .and_then(id_string)
        .ok_or_else(|| FetchError::ShopResolution {
            slug: slug.to_string(),
            reason: "no seller id in response".to_string(),
        })
}

/// Items from `mods.listItems`; absent `mods` means the page is not a listing.
pub fn parse_listing(body: &Value) -> Result<Vec<ItemStub>, FetchError> {
    let mods = body.get("mods").ok_or_else(|| FetchError::missing("mods"))?;
    let items = match mods.get("listItems") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(FetchError::Malformed(
                "'mods.listItems' is not an array".to_string(),
            ));
        }
    };
    items
        .iter()
        .map(|item| {
            let id = lookup(item, "itemId")
                .and_then(id_string)
                .ok_or_else(|| FetchError::missing("listItems[].itemId"))?;
            Ok(ItemStub::new(id, item.clone()))
        })
        .collect()
}

/// SKU ids of a detail payload, in listed order.
pub fn sku_ids(detail: &Value) -> Vec<String> {
    transform::sku_entries(detail)
        .into_iter()
        .map(|(id, _)| id)
        .collect()
}

#[async_trait]
impl SourceAdapter for LazadaAdapter {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Lazada
    }

    fn page_size(&self) -> u32 {
        self.config.page_size
    }

    fn pagination_delay(&self) -> Duration {
        self.config.page_delay
    }

    fn schema(&self) -> &'static RecordSchema {
        &transform::SCHEMA
    }

    async fn resolve_shop(&self, seller: &Seller) -> Result<ShopContext, FetchError> {
        let body = self.client.get_json(self.shop_request(&seller.slug)).await?;
        let seller_id = parse_seller_id(&seller.slug, &body)?;
        Ok(ShopContext {
            seller: seller.clone(),
            shop_id: Some(seller_id),
        })
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

    async fn fetch_detail(&self, shop: &ShopContext, stub: &ItemStub) -> Result<Value, FetchError> {
        let req = self.detail_request(shop.require_shop_id()?, &stub.id, None);
        take_data(self.client.get_json(req).await?)
    }

    fn variant_ids(&self, detail: &Value) -> Vec<String> {
        sku_ids(detail)
    }

    async fn fetch_variant(
        &self,
        shop: &ShopContext,
        stub: &ItemStub,
        variant_id: &str,
    ) -> Result<Value, FetchError> {
        let req = self.detail_request(shop.require_shop_id()?, &stub.id, Some(variant_id));
        take_data(self.client.get_json(req).await?)
    }

    fn normalize(&self, raw: &RawProduct) -> Result<ProductRecord, FetchError> {
        transform::normalize(raw)
    }
}
