//! Transform Lazada item and SKU payloads into canonical records
//!
//! Detail and per-SKU payloads keep prices as `{value}` objects and the
//! discount as a label (`"-20%"`); listing rows carry flat strings.

use marketline_core::normalize::{as_f64, first_of, id_string, lookup, number, percent};
use marketline_core::{
    FetchError, Marketplace, ProductRecord, RawProduct, RecordSchema, VariantRecord,
};
use serde_json::Value;

/// Lazada record layout
pub static SCHEMA: RecordSchema = RecordSchema {
    marketplace: Marketplace::Lazada,
    product: &[
        "id",
        "sku",
        "name",
        "price",
        "list_price",
        "discount",
        "discount_rate",
        "brand",
        "seller_id",
        "seller_name",
        "rating_average",
        "review_count",
        "sold",
        "location",
        "url",
        "image",
    ],
    variant: &[
        "id",
        "sku",
        "price",
        "list_price",
        "discount_rate",
        "stock",
        "properties",
    ],
};

static NO_PAYLOAD: Value = Value::Null;

/// Detail path first, then the listing row's flat key
fn pick(raw: &RawProduct, detail_path: &str, hint_key: &str) -> Option<Value> {
    first_of(&[&raw.detail], detail_path).or_else(|| first_of(&[&raw.hint], hint_key))
}

fn required(raw: &RawProduct, detail_path: &str, hint_key: &str) -> Result<Value, FetchError> {
    pick(raw, detail_path, hint_key).ok_or_else(|| FetchError::missing(hint_key))
}

fn numeric(value: Option<Value>) -> Option<f64> {
    value.as_ref().and_then(as_f64)
}

/// SKU entries of a detail payload with a usable id, in listed order.
///
/// The fetcher requests variants for exactly these ids.
pub fn sku_entries(detail: &Value) -> Vec<(String, &Value)> {
    lookup(detail, "skus")
        .and_then(Value::as_array)
        .map(|skus| {
            skus.iter()
                .filter_map(|sku| Some((lookup(sku, "skuId").and_then(id_string)?, sku)))
                .collect()
        })
        .unwrap_or_default()
}

/// Per-SKU payload answering `id`; position `index` when none names its SKU
fn payload_for<'a>(variants: &'a [Value], id: &str, index: usize) -> Option<&'a Value> {
    variants
        .iter()
        .find(|p| lookup(p, "sku.skuId").and_then(id_string).as_deref() == Some(id))
        .or_else(|| {
            variants
                .get(index)
                .filter(|p| lookup(p, "sku.skuId").is_none())
        })
}

pub fn normalize(raw: &RawProduct) -> Result<ProductRecord, FetchError> {
    let id = required(raw, "item.itemId", "itemId")?;
    let name = required(raw, "item.title", "name")?;

    let price = numeric(pick(raw, "price.salePrice.value", "price"));
    let list_price = numeric(pick(raw, "price.originalPrice.value", "originalPrice"));
    let discount = price.zip(list_price).map(|(p, l)| l - p);

    let skus = sku_entries(&raw.detail);
    let selected = lookup(&raw.detail, "selectedSkuId").cloned();
    let selected_id = selected.as_ref().and_then(id_string);
    let selected_sku = selected_id.as_deref().and_then(|sel| {
        skus.iter()
            .find(|(id, _)| id == sel)
            .and_then(|(_, entry)| lookup(entry, "sellerSku").cloned())
    });

    let record = ProductRecord::from_fields(&SCHEMA, |field| match field {
        "id" => Some(id.clone()),
        "name" => Some(name.clone()),
        "sku" => selected_sku.clone(),
        "price" => price.map(number),
        "list_price" => list_price.map(number),
        "discount" => discount.map(number),
        "discount_rate" => pick(raw, "price.discount", "discount")
            .as_ref()
            .and_then(percent),
        "brand" => pick(raw, "item.brand", "brandName"),
        "seller_id" => pick(raw, "seller.sellerId", "sellerId"),
        "seller_name" => pick(raw, "seller.name", "sellerName"),
        "rating_average" => numeric(pick(raw, "item.ratingScore", "ratingScore")).map(number),
        "review_count" => pick(raw, "item.review", "review"),
        "sold" => first_of(&[&raw.hint], "itemSoldCntShow"),
        "location" => first_of(&[&raw.hint], "location"),
        "url" => first_of(&[&raw.hint], "itemUrl"),
        "image" => pick(raw, "item.image", "image"),
        _ => None,
    });

    let variants: Vec<VariantRecord> = skus
        .iter()
        .enumerate()
        .map(|(i, (id, entry))| {
            let payload = payload_for(&raw.variants, id, i).unwrap_or(&NO_PAYLOAD);
            variant(entry, payload)
        })
        .collect();

    Ok(record.with_variants(variants, selected))
}

/// One SKU: pricing from its own payload, identity from the detail entry
fn variant(entry: &Value, payload: &Value) -> VariantRecord {
    let sources = [payload, entry];
    VariantRecord::from_fields(&SCHEMA, |field| match field {
        "id" => first_of(&sources, "sku.skuId").or_else(|| first_of(&sources, "skuId")),
        "sku" => first_of(&sources, "sku.sellerSku").or_else(|| first_of(&sources, "sellerSku")),
        "price" => numeric(first_of(&sources, "price.salePrice.value")).map(number),
        "list_price" => numeric(first_of(&sources, "price.originalPrice.value")).map(number),
        "discount_rate" => first_of(&sources, "price.discount").as_ref().and_then(percent),
        "stock" => first_of(&sources, "sku.stock").or_else(|| first_of(&sources, "stock")),
        "properties" => {
            first_of(&sources, "sku.properties").or_else(|| first_of(&sources, "properties"))
        }
        _ => None,
    })
}
