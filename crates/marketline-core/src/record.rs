//! Canonical product records.
//!
//! A record's field set is fixed per marketplace by its [`RecordSchema`]:
//! every schema field is present as a key, with `null` when the source did not
//! return it. Construction goes through [`ProductRecord::from_fields`] and
//! [`VariantRecord::from_fields`], which walk the schema, so a record can not
//! be missing a key.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, FetchError};
use crate::source::Marketplace;

/// Fields every marketplace schema starts with.
pub const CORE_FIELDS: [&str; 7] = [
    "id",
    "sku",
    "name",
    "price",
    "list_price",
    "discount",
    "discount_rate",
];

/// Closed field set for one marketplace's products and variants.
#[derive(Debug)]
pub struct RecordSchema {
    pub marketplace: Marketplace,
    pub product: &'static [&'static str],
    pub variant: &'static [&'static str],
}

impl RecordSchema {
    /// Whether the product field list begins with [`CORE_FIELDS`]
    pub fn has_core_fields(&self) -> bool {
        self.product.len() >= CORE_FIELDS.len()
            && self.product[..CORE_FIELDS.len()] == CORE_FIELDS
    }

    /// Whether `record` carries exactly this schema's keys, variants included
    pub fn conforms(&self, record: &ProductRecord) -> bool {
        record.marketplace == self.marketplace
            && same_keys(self.product, &record.fields)
            && record
                .variants
                .iter()
                .all(|v| same_keys(self.variant, &v.fields))
    }
}

fn same_keys(names: &[&str], fields: &Map<String, Value>) -> bool {
    names.len() == fields.len() && names.iter().all(|n| fields.contains_key(*n))
}

fn fill(names: &[&str], mut get: impl FnMut(&str) -> Option<Value>) -> Map<String, Value> {
    names
        .iter()
        .map(|&name| (name.to_string(), get(name).unwrap_or(Value::Null)))
        .collect()
}

/// One purchasable configuration of a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariantRecord {
    fields: Map<String, Value>,
}

impl VariantRecord {
    pub fn from_fields(schema: &RecordSchema, get: impl FnMut(&str) -> Option<Value>) -> Self {
        Self {
            fields: fill(schema.variant, get),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Normalized product with its variants.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    marketplace: Marketplace,
    fields: Map<String, Value>,
    variants: Vec<VariantRecord>,
    selected_variant: Value,
    batched_at: Option<DateTime<Utc>>,
}

impl ProductRecord {
    pub fn from_fields(schema: &RecordSchema, get: impl FnMut(&str) -> Option<Value>) -> Self {
        Self {
            marketplace: schema.marketplace,
            fields: fill(schema.product, get),
            variants: Vec::new(),
            selected_variant: Value::Null,
            batched_at: None,
        }
    }

    /// Attach variants and the id of the variant the source marks as selected.
    pub fn with_variants(mut self, variants: Vec<VariantRecord>, selected: Option<Value>) -> Self {
        self.variants = variants;
        self.selected_variant = selected.unwrap_or(Value::Null);
        self
    }

    pub fn marketplace(&self) -> Marketplace {
        self.marketplace
    }

    /// Field value; `Some(Value::Null)` for schema fields the source lacked
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// `id` rendered as a string (numbers included)
    pub fn id(&self) -> String {
        match self.fields.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn variants(&self) -> &[VariantRecord] {
        &self.variants
    }

    pub fn selected_variant(&self) -> &Value {
        &self.selected_variant
    }

    pub fn batched_at(&self) -> Option<DateTime<Utc>> {
        self.batched_at
    }

    pub(crate) fn stamp(&mut self, at: DateTime<Utc>) {
        self.batched_at = Some(at);
    }
}

impl Serialize for ProductRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 3))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.serialize_entry("variants", &self.variants)?;
        map.serialize_entry("selected_variant", &self.selected_variant)?;
        map.serialize_entry("batched_at", &self.batched_at)?;
        map.end()
    }
}

/// Explicit marker for an item that could not be fetched or normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedRecord {
    pub id: String,
    pub error: ErrorKind,
    pub message: String,
    pub batched_at: Option<DateTime<Utc>>,
}

impl FailedRecord {
    pub fn new(id: impl Into<String>, err: &FetchError) -> Self {
        Self {
            id: id.into(),
            error: err.kind(),
            message: err.to_string(),
            batched_at: None,
        }
    }
}

/// One slot of a batch, in listing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordEntry {
    Ok(ProductRecord),
    Failed(FailedRecord),
}

impl RecordEntry {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn id(&self) -> String {
        match self {
            Self::Ok(r) => r.id(),
            Self::Failed(f) => f.id.clone(),
        }
    }

    pub fn batched_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Ok(r) => r.batched_at,
            Self::Failed(f) => f.batched_at,
        }
    }

    pub fn as_product(&self) -> Option<&ProductRecord> {
        match self {
            Self::Ok(r) => Some(r),
            Self::Failed(_) => None,
        }
    }

    pub(crate) fn stamp(&mut self, at: DateTime<Utc>) {
        match self {
            Self::Ok(r) => r.stamp(at),
            Self::Failed(f) => f.batched_at = Some(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static SCHEMA: RecordSchema = RecordSchema {
        marketplace: Marketplace::Tiki,
        product: &[
            "id",
            "sku",
            "name",
            "price",
            "list_price",
            "discount",
            "discount_rate",
            "brand",
        ],
        variant: &["id", "price"],
    };

    #[test]
    fn missing_fields_become_null() {
        let raw = json!({"id": 1, "name": "Nệm"});
        let rec = ProductRecord::from_fields(&SCHEMA, |k| raw.get(k).cloned());
        assert_eq!(rec.fields().len(), SCHEMA.product.len());
        assert_eq!(rec.get("brand"), Some(&Value::Null));
        assert_eq!(rec.get("name"), Some(&json!("Nệm")));
        assert_eq!(rec.get("not_in_schema"), None);
    }

    #[test]
    fn schema_has_core_fields() {
        assert!(SCHEMA.has_core_fields());
    }

    #[test]
    fn conformance_checks_product_and_variant_keys() {
        static OTHER: RecordSchema = RecordSchema {
            marketplace: Marketplace::Tiki,
            product: &["id", "name"],
            variant: &["id"],
        };
        let variant = VariantRecord::from_fields(&SCHEMA, |_| None);
        let rec = ProductRecord::from_fields(&SCHEMA, |_| None).with_variants(vec![variant], None);
        assert!(SCHEMA.conforms(&rec));
        assert!(!OTHER.conforms(&rec));

        let foreign = VariantRecord::from_fields(&OTHER, |_| None);
        let mixed = ProductRecord::from_fields(&SCHEMA, |_| None).with_variants(vec![foreign], None);
        assert!(!SCHEMA.conforms(&mixed));
    }

    #[test]
    fn numeric_id_as_string() {
        let rec = ProductRecord::from_fields(&SCHEMA, |k| (k == "id").then(|| json!(123)));
        assert_eq!(rec.id(), "123");
    }

    #[test]
    fn serialized_record_has_every_key() {
        let mut rec = ProductRecord::from_fields(&SCHEMA, |_| None);
        rec.stamp(DateTime::from_timestamp(0, 0).unwrap());
        let v = serde_json::to_value(RecordEntry::Ok(rec)).unwrap();
        let obj = v.as_object().unwrap();
        for field in SCHEMA.product {
            assert!(obj.contains_key(*field), "missing {field}");
        }
        assert_eq!(v["status"], "ok");
        assert_eq!(v["variants"], json!([]));
        assert_eq!(v["selected_variant"], Value::Null);
        assert_eq!(v["batched_at"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn failed_record_serializes_marker() {
        let err = FetchError::from_status(500, "Internal Server Error");
        let v = serde_json::to_value(RecordEntry::Failed(FailedRecord::new("42", &err))).unwrap();
        assert_eq!(v["status"], "failed");
        assert_eq!(v["id"], "42");
        assert_eq!(v["error"], "transport");
    }

    #[test]
    fn variants_serialize_as_objects() {
        let variant = VariantRecord::from_fields(&SCHEMA, |k| (k == "id").then(|| json!("v1")));
        let rec = ProductRecord::from_fields(&SCHEMA, |_| None)
            .with_variants(vec![variant], Some(json!("v1")));
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["variants"], json!([{"id": "v1", "price": null}]));
        assert_eq!(v["selected_variant"], "v1");
    }
}
