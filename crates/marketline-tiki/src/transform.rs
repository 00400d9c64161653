//! Transform Tiki product payloads into canonical records

use marketline_core::normalize::{first_of, lookup, require};
use marketline_core::{
    FetchError, Marketplace, ProductRecord, RawProduct, RecordSchema, VariantRecord,
};
use serde_json::Value;

/// Tiki record layout
pub static SCHEMA: RecordSchema = RecordSchema {
    marketplace: Marketplace::Tiki,
    product: &[
        "id",
        "sku",
        "name",
        "price",
        "list_price",
        "discount",
        "discount_rate",
        "url_key",
        "url_path",
        "price_usd",
        "rating_average",
        "review_count",
        "order_count",
        "quantity_sold",
        "favourite_count",
        "inventory_status",
        "is_visible",
        "productset_group_name",
        "brand_name",
        "thumbnail_url",
        "seller",
        "seller_product_id",
        "sp_seller_id",
        "sp_seller_name",
        "installment_info",
    ],
    variant: &[
        "id",
        "sku",
        "name",
        "price",
        "list_price",
        "option1",
        "option2",
        "inventory_status",
        "thumbnail_url",
    ],
};

/// Fields whose absence makes the payload unusable
const REQUIRED: [&str; 5] = ["id", "sku", "name", "url_key", "url_path"];

/// Payload path for a schema field when it differs from the field name
fn source_path(field: &str) -> &str {
    match field {
        "quantity_sold" => "quantity_sold.value",
        "brand_name" => "brand.name",
        _ => field,
    }
}

/// Normalize one Tiki product. Detail values win over the listing row.
pub fn normalize(raw: &RawProduct) -> Result<ProductRecord, FetchError> {
    let sources = [&raw.detail, &raw.hint];
    for field in REQUIRED {
        require(&sources, field)?;
    }

    let record = ProductRecord::from_fields(&SCHEMA, |field| match field {
        // The detail names the store's offer `current_seller`
        "seller" => first_of(&sources, "current_seller").or_else(|| first_of(&sources, "seller")),
        _ => first_of(&sources, source_path(field)),
    });

    let options = lookup(&raw.detail, "configurable_products")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let variants: Vec<VariantRecord> = options
        .iter()
        .map(|option| VariantRecord::from_fields(&SCHEMA, |field| lookup(option, field).cloned()))
        .collect();
    let selected = options
        .iter()
        .find(|option| option.get("selected").and_then(Value::as_bool) == Some(true))
        .and_then(|option| lookup(option, "id").cloned());

    Ok(record.with_variants(variants, selected))
}
