//! Conversion between plain JSON and Firestore typed values.
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type (`{"stringValue": "m"}`, `{"integerValue": "2"}`, ...). Documents are
//! stored in that form and converted to plain JSON at the client boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

/// Encode a plain JSON value as a Firestore value.
#[must_use]
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => n.as_i64().map_or_else(
            || json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
            |i| json!({ "integerValue": i.to_string() }),
        ),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            if items.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                let values: Vec<Value> = items.iter().map(encode).collect();
                json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode every field of a plain JSON object.
#[must_use]
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode(value)))
        .collect()
}

/// Firestore timestamp value.
#[must_use]
pub fn timestamp(at: DateTime<Utc>) -> Value {
    json!({ "timestampValue": at.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

/// Decode a Firestore value to plain JSON.
///
/// Timestamps, references and bytes become strings. Unknown value kinds decode
/// to `null`.
#[must_use]
pub fn decode(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|map| map.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "booleanValue" => inner.as_bool().map_or(Value::Null, Value::Bool),
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        "geoPointValue" => inner.clone(),
        _ => Value::Null,
    }
}

/// Decode every field of a Firestore document.
#[must_use]
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode(value)))
        .collect()
}

// Integers travel as strings so they keep 64-bit precision.
fn decode_integer(inner: &Value) -> Value {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map_or_else(|_| inner.clone(), |i| Value::Number(i.into())),
        Value::Number(_) => inner.clone(),
        _ => Value::Null,
    }
}

// Doubles may be sent as the strings "NaN" or "Infinity"; those have no JSON form.
fn decode_double(inner: &Value) -> Value {
    inner
        .as_f64()
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_encode_line_item() {
        let item = json!({"id": 7, "name": "Scarf", "price": 425.5, "selectedSize": "m"});
        let encoded = encode(&item);
        assert_eq!(
            encoded,
            json!({"mapValue": {"fields": {
                "id": {"integerValue": "7"},
                "name": {"stringValue": "Scarf"},
                "price": {"doubleValue": 425.5},
                "selectedSize": {"stringValue": "m"}
            }}})
        );
    }

    #[test]
    fn test_empty_array_encoding() {
        assert_eq!(encode(&json!([])), json!({"arrayValue": {}}));
        assert_eq!(decode(&json!({"arrayValue": {}})), json!([]));
    }

    #[test]
    fn test_decode_restores_plain_json() {
        let cart = json!([
            {"id": "abc", "name": "Coat", "price": 10, "quantity": 2, "image": null},
            {"id": 3, "name": "Boots", "price": 99.9, "gift": true}
        ]);
        assert_eq!(decode(&encode(&cart)), cart);
    }

    #[test]
    fn test_decode_timestamp_and_unknown() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            decode(&timestamp(at)),
            json!("2026-03-01T12:00:00.000000Z")
        );
        assert_eq!(decode(&json!({"mysteryValue": 1})), Value::Null);
        assert_eq!(decode(&json!("bare")), Value::Null);
    }

    #[test]
    fn test_decode_special_doubles() {
        assert_eq!(decode(&json!({"doubleValue": "NaN"})), Value::Null);
        assert_eq!(decode(&json!({"integerValue": "12"})), json!(12));
    }
}
