//! Shopee API client

use async_trait::async_trait;
use marketline_core::normalize::{id_string, lookup, take_data};
use marketline_core::{
    ApiClient, ApiRequest, FetchError, ItemStub, Marketplace, ProductRecord, RawProduct,
    RecordSchema, Seller, ShopContext, SourceAdapter,
};
use serde_json::Value;

use crate::config::Config;
use crate::transform;

/// Shopee shop adapter
#[derive(Debug, Clone)]
pub struct ShopeeAdapter {
    client: ApiClient,
    config: Config,
}

impl ShopeeAdapter {
    pub fn new(client: ApiClient, config: Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `{base}/api/v4/{path}` with the headers Shopee expects from its web app
    fn request(&self, path: &str, slug: &str) -> ApiRequest {
        let base = self.config.base_url.trim_end_matches('/');
        ApiRequest::get(format!("{base}/api/v4/{path}"))
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Referer", format!("{base}/{slug}"))
    }

    pub fn shop_request(&self, slug: &str) -> ApiRequest {
        self.request("shop/get_shop_detail", slug)
            .query("username", slug)
    }

    /// Page `page` (1-based) as an offset window
    pub fn listing_request(&self, slug: &str, shop_id: &str, page: u32) -> ApiRequest {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(self.config.page_size);
        self.request("shop/search_items", slug)
            .query("shopid", shop_id)
            .query("limit", self.config.page_size)
            .query("offset", offset)
    }

    pub fn detail_request(&self, slug: &str, shop_id: &str, item_id: &str) -> ApiRequest {
        self.request("item/get", slug)
            .query("itemid", item_id)
            .query("shopid", shop_id)
    }
}

/// Shop id from a `get_shop_detail` body.
pub fn parse_shop_id(slug: &str, body: &Value) -> Result<String, FetchError> {
    lookup(body, "data.shopid")
        .and_then(id_string)
        .ok_or_else(|| FetchError::ShopResolution {
            slug: slug.to_string(),
            reason: "no shop id in response".to_string(),
        })
}

/// Shopee answers some failures (anti-bot, unknown shop) with HTTP 200 and a
/// non-zero `error` code instead of a payload.
pub fn check_error(body: &Value) -> Result<(), FetchError> {
    let code = match body.get("error") {
        None | Some(Value::Null) => return Ok(()),
        Some(code) if code.as_i64() == Some(0) || code.as_str() == Some("0") => return Ok(()),
        Some(code) => code,
    };
    let msg = lookup(body, "error_msg")
        .and_then(Value::as_str)
        .unwrap_or("no message");
    Err(FetchError::Malformed(format!("shopee error {code}: {msg}")))
}

/// Items from a `search_items` body.
///
/// Absent, null or empty `items` ends the listing, unless the body carries an
/// error code.
pub fn parse_listing(body: &Value) -> Result<Vec<ItemStub>, FetchError> {
    check_error(body)?;
    let items = match body.get("items") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(FetchError::Malformed("'items' is not an array".to_string())),
    };
    items
        .iter()
        .map(|item| {
            let basic = item.get("item_basic").filter(|b| b.is_object());
            let id = lookup(item, "itemid")
                .or_else(|| basic.and_then(|b| lookup(b, "itemid")))
                .and_then(id_string)
                .ok_or_else(|| FetchError::missing("items[].itemid"))?;
            Ok(ItemStub::new(id, basic.unwrap_or(item).clone()))
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for ShopeeAdapter {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Shopee
    }

    fn page_size(&self) -> u32 {
        self.config.page_size
    }

    fn schema(&self) -> &'static RecordSchema {
        &transform::SCHEMA
    }

    async fn resolve_shop(&self, seller: &Seller) -> Result<ShopContext, FetchError> {
        let body = self.client.get_json(self.shop_request(&seller.slug)).await?;
        let shop_id = parse_shop_id(&seller.slug, &body)?;
        Ok(ShopContext {
            seller: seller.clone(),
            shop_id: Some(shop_id),
        })
    }

    async fn list_page(&self, shop: &ShopContext, page: u32) -> Result<Vec<ItemStub>, FetchError> {
        let req = self.listing_request(shop.slug(), shop.require_shop_id()?, page);
        let body = self.client.get_json(req).await?;
        let stubs = parse_listing(&body)?;
        log::debug!("{}: page {page}, {} items", shop.seller, stubs.len());
        Ok(stubs)
    }

    async fn fetch_detail(&self, shop: &ShopContext, stub: &ItemStub) -> Result<Value, FetchError> {
        let req = self.detail_request(shop.slug(), shop.require_shop_id()?, &stub.id);
        let body = self.client.get_json(req).await?;
        check_error(&body)?;
        take_data(body)
    }

    fn normalize(&self, raw: &RawProduct) -> Result<ProductRecord, FetchError> {
        transform::normalize(raw)
    }
}
