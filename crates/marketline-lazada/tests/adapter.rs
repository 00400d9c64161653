//! Lazada adapter against canned API responses

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use marketline_core::{
    ApiClient, ApiRequest, ConcurrencyLimiter, FetchError, FnTransport, HarvestTarget, Harvester,
    ItemStub, Marketplace, RetryPolicy, Seller, ShopContext, SourceAdapter, StaticIdentity,
};
use marketline_lazada::{Config, LazadaAdapter};
use serde_json::{Value, json};

type Log = Arc<Mutex<Vec<ApiRequest>>>;

const PAGE_DELAY: Duration = Duration::from_millis(20);

fn adapter<F>(respond: F) -> (LazadaAdapter, Log)
where
    F: Fn(&ApiRequest) -> Result<Value, FetchError> + Send + Sync + 'static,
{
    let log: Log = Arc::default();
    let seen = log.clone();
    let transport = FnTransport(move |req: &ApiRequest| {
        seen.lock().unwrap().push(req.clone());
        respond(req)
    });
    let client = ApiClient::new(
        Arc::new(transport),
        Arc::new(StaticIdentity("fixture-agent".into())),
    );
    let config = Config {
        page_delay: PAGE_DELAY,
        ..Config::default()
    };
    (LazadaAdapter::new(client, config), log)
}

/// Store with two listing pages; every item has two SKUs
fn store(req: &ApiRequest) -> Result<Value, FetchError> {
    if req.url.ends_with("/shop/api/info") {
        return Ok(json!({"success": true, "data": {"sellerId": 100123}}));
    }
    if req.url.ends_with("/pdp/item") {
        assert_eq!(req.query_value("sellerId"), Some("100123"));
        let item: u64 = req.query_value("itemId").unwrap().parse().unwrap();
        return Ok(match req.query_value("skuId") {
            None => json!({"data": {
                "item": {"itemId": item, "title": format!("Item {item}")},
                "selectedSkuId": item * 10 + 1,
                "skus": [{"skuId": item * 10 + 1}, {"skuId": item * 10 + 2}]
            }}),
            Some(sku) => json!({"data": {
                "sku": {"skuId": sku.parse::<u64>().unwrap(), "stock": 5},
                "price": {"salePrice": {"value": 100000}, "originalPrice": {"value": 125000}, "discount": "-20%"}
            }}),
        });
    }
    let page: u32 = req.query_value("page").unwrap().parse().unwrap();
    let items: Vec<Value> = match page {
        1 => vec![json!({"itemId": "1", "name": "Item 1"}), json!({"itemId": "2", "name": "Item 2"})],
        2 => vec![json!({"itemId": "3", "name": "Item 3"})],
        _ => vec![],
    };
    Ok(json!({"mods": {"listItems": items}}))
}

#[tokio::test]
async fn listing_request_shape() {
    let (adapter, log) = adapter(|_| Ok(json!({"mods": {}})));
    let shop = ShopContext {
        seller: Seller::new(Marketplace::Lazada, "acme-official"),
        shop_id: Some("100123".to_string()),
    };
    assert!(adapter.list_page(&shop, 2).await.unwrap().is_empty());

    let log = log.lock().unwrap();
    assert_eq!(log[0].url, "https://www.lazada.vn/acme-official/");
    assert_eq!(log[0].query_value("ajax"), Some("true"));
    assert_eq!(log[0].query_value("from"), Some("wangpu"));
    assert_eq!(log[0].query_value("page"), Some("2"));
    assert_eq!(log[0].query_value("limit"), Some("40"));
}

#[tokio::test]
async fn variant_request_adds_sku() {
    let (adapter, log) = adapter(store);
    let shop = ShopContext {
        seller: Seller::new(Marketplace::Lazada, "acme-official"),
        shop_id: Some("100123".to_string()),
    };
    let stub = ItemStub::new("7", json!({"itemId": "7"}));
    let payload = adapter.fetch_variant(&shop, &stub, "71").await.unwrap();
    assert_eq!(payload["sku"]["skuId"], 71);

    let log = log.lock().unwrap();
    assert_eq!(log[0].url, "https://pdp.lazada.vn/pdp/item");
    assert_eq!(log[0].query_value("itemId"), Some("7"));
    assert_eq!(log[0].query_value("skuId"), Some("71"));
}

#[tokio::test]
async fn detail_without_resolved_shop_fails() {
    let (adapter, _) = adapter(store);
    let shop = ShopContext::unresolved(&Seller::new(Marketplace::Lazada, "acme-official"));
    let stub = ItemStub::new("7", json!({}));
    assert!(matches!(
        adapter.fetch_detail(&shop, &stub).await,
        Err(FetchError::ShopResolution { .. })
    ));
}

#[tokio::test]
async fn harvest_store_expands_skus_and_paces_pages() {
    let (adapter, log) = adapter(store);
    let harvester = Harvester::new(Arc::new(ConcurrencyLimiter::new(2)), RetryPolicy::none());
    let target = HarvestTarget {
        adapter: Arc::new(adapter),
        seller: Seller::new(Marketplace::Lazada, "acme-official"),
    };

    let start = Instant::now();
    let outcomes = harvester.harvest(&[target], Utc::now()).await;
    // Delay before pages 2 and 3, never before page 1
    assert!(start.elapsed() >= PAGE_DELAY * 2);

    let batch = outcomes[0].result.as_ref().unwrap();
    assert_eq!(batch.ok_count(), 3);

    let record = batch.records[0].as_product().unwrap();
    assert_eq!(record.get("name"), Some(&json!("Item 1")));
    assert_eq!(record.selected_variant(), &json!(11));
    assert_eq!(record.variants().len(), 2);
    assert_eq!(record.variants()[1].get("id"), Some(&json!(12)));
    assert_eq!(record.variants()[1].get("discount_rate"), Some(&json!(20)));

    let log = log.lock().unwrap();
    let sku_requests = log.iter().filter(|r| r.query_value("skuId").is_some()).count();
    assert_eq!(sku_requests, 6);
}
