//! Optional-access helpers for marketplace transforms.
//!
//! Paths are dot-separated object keys (`"item_rating.rating_star"`). A key
//! that is absent or `null` reads as `None`; only [`require`] turns absence
//! into an error.

use serde_json::Value;

use crate::error::FetchError;

/// Walk a dotted path; `None` if any segment is missing or the leaf is null.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |cur, key| cur.get(key))
        .filter(|v| !v.is_null())
}

/// First non-null value for `path` across `sources`, in order.
pub fn first_of(sources: &[&Value], path: &str) -> Option<Value> {
    sources.iter().find_map(|v| lookup(v, path)).cloned()
}

/// Like [`first_of`] but a missing value is a malformed payload.
pub fn require(sources: &[&Value], path: &str) -> Result<Value, FetchError> {
    first_of(sources, path).ok_or_else(|| FetchError::missing(path))
}

/// Unwrap the `{"data": ...}` envelope; a missing or null `data` is malformed.
pub fn take_data(body: Value) -> Result<Value, FetchError> {
    match body {
        Value::Object(mut map) => map
            .remove("data")
            .filter(|data| !data.is_null())
            .ok_or_else(|| FetchError::missing("data")),
        _ => Err(FetchError::Malformed("body is not an object".to_string())),
    }
}

/// Render an id that marketplaces send as either number or string.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a number that may arrive as a JSON number or a numeric string.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// JSON number, integral when the value has no fractional part.
pub fn number(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < i64::MAX as f64 {
        Value::from(x as i64)
    } else {
        serde_json::Number::from_f64(x).map_or(Value::Null, Value::Number)
    }
}

/// Parse a percentage label such as `"-20%"` or `"20%"` into `20`.
pub fn percent(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let digits = s.trim().trim_start_matches('-').trim_end_matches('%').trim();
            digits.parse::<f64>().ok().map(number)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_nested() {
        let v = json!({"a": {"b": 3}});
        assert_eq!(lookup(&v, "a.b"), Some(&json!(3)));
        assert_eq!(lookup(&v, "a.c"), None);
        assert_eq!(lookup(&v, "x.y"), None);
    }

    #[test]
    fn lookup_null_is_none() {
        let v = json!({"a": null});
        assert_eq!(lookup(&v, "a"), None);
    }

    #[test]
    fn first_of_falls_back() {
        let detail = json!({"price": null});
        let listing = json!({"price": 100});
        assert_eq!(first_of(&[&detail, &listing], "price"), Some(json!(100)));
    }

    #[test]
    fn require_missing_is_malformed() {
        let v = json!({});
        assert_eq!(require(&[&v], "sku"), Err(FetchError::missing("sku")));
    }

    #[test]
    fn take_data_envelope() {
        assert_eq!(take_data(json!({"data": {"a": 1}})), Ok(json!({"a": 1})));
        assert_eq!(take_data(json!({"data": null})), Err(FetchError::missing("data")));
        assert!(take_data(json!([1])).is_err());
    }

    #[test]
    fn id_string_variants() {
        assert_eq!(id_string(&json!(12)), Some("12".to_string()));
        assert_eq!(id_string(&json!("ab")), Some("ab".to_string()));
        assert_eq!(id_string(&json!("")), None);
        assert_eq!(id_string(&json!(null)), None);
    }

    #[test]
    fn as_f64_strings() {
        assert_eq!(as_f64(&json!("1,250,000")), Some(1_250_000.0));
        assert_eq!(as_f64(&json!(12.5)), Some(12.5));
        assert_eq!(as_f64(&json!("n/a")), None);
    }

    #[test]
    fn number_integral() {
        assert_eq!(number(199000.0), json!(199000));
        assert_eq!(number(1.5), json!(1.5));
    }

    #[test]
    fn percent_labels() {
        assert_eq!(percent(&json!("-20%")), Some(json!(20)));
        assert_eq!(percent(&json!("15%")), Some(json!(15)));
        assert_eq!(percent(&json!(7)), Some(json!(7)));
        assert_eq!(percent(&json!("sale")), None);
    }
}
