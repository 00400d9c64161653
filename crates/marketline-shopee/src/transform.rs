//! Transform Shopee item payloads into canonical records
//!
//! Shopee reports money as integers scaled by [`PRICE_SCALE`]; a
//! `price_before_discount` of 0 means the item is not discounted.

use marketline_core::normalize::{as_f64, first_of, lookup, number, require};
use marketline_core::{
    FetchError, Marketplace, ProductRecord, RawProduct, RecordSchema, VariantRecord,
};
use serde_json::Value;

pub const PRICE_SCALE: f64 = 100_000.0;

/// Shopee record layout
pub static SCHEMA: RecordSchema = RecordSchema {
    marketplace: Marketplace::Shopee,
    product: &[
        "id",
        "sku",
        "name",
        "price",
        "list_price",
        "discount",
        "discount_rate",
        "shop_id",
        "brand",
        "currency",
        "stock",
        "sold",
        "historical_sold",
        "liked_count",
        "rating_average",
        "review_count",
        "image",
        "shop_location",
    ],
    variant: &["id", "name", "price", "list_price", "stock", "sold"],
};

const REQUIRED: [&str; 2] = ["itemid", "name"];

/// Unscaled price, `None` for absent or zero
fn price(value: Option<Value>) -> Option<f64> {
    value
        .as_ref()
        .and_then(as_f64)
        .filter(|p| *p > 0.0)
        .map(|p| p / PRICE_SCALE)
}

/// `(price, list_price, discount)` from a payload with Shopee price keys
fn prices(sources: &[&Value]) -> (Option<f64>, Option<f64>, Option<f64>) {
    let price_now = price(first_of(sources, "price")).or_else(|| price(first_of(sources, "price_min")));
    let list = price(first_of(sources, "price_before_discount"));
    let discount = price_now.zip(list).map(|(p, l)| l - p);
    (price_now, list, discount)
}

pub fn normalize(raw: &RawProduct) -> Result<ProductRecord, FetchError> {
    let sources = [&raw.detail, &raw.hint];
    for field in REQUIRED {
        require(&sources, field)?;
    }
    let (price_now, list, discount) = prices(&sources);

    let record = ProductRecord::from_fields(&SCHEMA, |field| match field {
        "id" => first_of(&sources, "itemid"),
        "sku" => first_of(&sources, "model_sku"),
        "price" => price_now.map(number),
        "list_price" => list.map(number),
        "discount" => discount.map(number),
        "discount_rate" => first_of(&sources, "raw_discount"),
        "shop_id" => first_of(&sources, "shopid"),
        "rating_average" => first_of(&sources, "item_rating.rating_star"),
        "review_count" => first_of(&sources, "cmt_count"),
        _ => first_of(&sources, field),
    });

    let variants: Vec<VariantRecord> = lookup(&raw.detail, "models")
        .and_then(Value::as_array)
        .map(|models| models.iter().map(variant).collect())
        .unwrap_or_default();

    // Shopee marks no default model
    Ok(record.with_variants(variants, None))
}

fn variant(model: &Value) -> VariantRecord {
    let (price_now, list, _) = prices(&[model]);
    VariantRecord::from_fields(&SCHEMA, |field| match field {
        "id" => lookup(model, "modelid").cloned(),
        "price" => price_now.map(number),
        "list_price" => list.map(number),
        _ => lookup(model, field).cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(detail: Value) -> RawProduct {
        RawProduct {
            hint: json!({"itemid": 555, "name": "Áo thun", "shopid": 88}),
            detail,
            variants: vec![],
        }
    }

    #[test]
    fn schema_starts_with_core_fields() {
        assert!(SCHEMA.has_core_fields());
    }

    #[test]
    fn prices_are_unscaled() {
        let record = normalize(&raw(json!({
            "price": 15_000_000_000i64,
            "price_before_discount": 20_000_000_000i64,
            "raw_discount": 25
        })))
        .unwrap();
        assert_eq!(record.get("price"), Some(&json!(150000)));
        assert_eq!(record.get("list_price"), Some(&json!(200000)));
        assert_eq!(record.get("discount"), Some(&json!(50000)));
        assert_eq!(record.get("discount_rate"), Some(&json!(25)));
    }

    #[test]
    fn zero_list_price_means_no_discount() {
        let record = normalize(&raw(json!({"price": 9_900_000_000i64, "price_before_discount": 0})))
            .unwrap();
        assert_eq!(record.get("price"), Some(&json!(99000)));
        assert_eq!(record.get("list_price"), Some(&Value::Null));
        assert_eq!(record.get("discount"), Some(&Value::Null));
    }

    #[test]
    fn missing_fields_are_null() {
        let record = normalize(&raw(json!({}))).unwrap();
        assert_eq!(record.fields().len(), SCHEMA.product.len());
        assert_eq!(record.get("id"), Some(&json!(555)));
        assert_eq!(record.get("shop_id"), Some(&json!(88)));
        assert_eq!(record.get("brand"), Some(&Value::Null));
        assert_eq!(record.get("sku"), Some(&Value::Null));
    }

    #[test]
    fn models_become_variants_without_selection() {
        let record = normalize(&raw(json!({
            "item_rating": {"rating_star": 4.8},
            "models": [
                {"modelid": 1, "name": "S", "price": 10_000_000_000i64, "stock": 3},
                {"modelid": 2, "name": "M", "price": 12_000_000_000i64}
            ]
        })))
        .unwrap();
        assert_eq!(record.get("rating_average"), Some(&json!(4.8)));
        assert_eq!(record.variants().len(), 2);
        assert_eq!(record.variants()[0].get("price"), Some(&json!(100000)));
        assert_eq!(record.variants()[1].get("stock"), Some(&Value::Null));
        assert_eq!(record.selected_variant(), &Value::Null);
    }

    #[test]
    fn missing_name_is_malformed() {
        let product = RawProduct {
            hint: json!({"itemid": 1}),
            detail: json!({}),
            variants: vec![],
        };
        assert_eq!(normalize(&product), Err(FetchError::missing("name")));
    }

    #[test]
    fn normalization_is_idempotent() {
        let product = raw(json!({"price": 100000, "models": [{"modelid": 1}]}));
        assert_eq!(normalize(&product), normalize(&product));
    }
}
