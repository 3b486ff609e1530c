//! Conversion between plain JSON and Firestore typed values.

use house_worker_core::{Fields, StoreError};
use serde_json::{json, Map, Value};

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let obj = value
        .as_object()
        .ok_or_else(|| StoreError::Parse(format!("typed value is not an object: {}", value)))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| StoreError::Parse("empty typed value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(inner.clone()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| StoreError::Parse(format!("bad integerValue: {}", inner)))
        }
        "doubleValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values").and_then(Value::as_array) {
                Some(values) => values.iter().map(decode_value).collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields").and_then(Value::as_object) {
                Some(fields) => decode_fields(fields)?,
                None => Fields::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(StoreError::Parse(format!("unknown value type: {}", other))),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields, StoreError> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode_value(&json!(null)), json!({"nullValue": null}));
        assert_eq!(encode_value(&json!(true)), json!({"booleanValue": true}));
        assert_eq!(encode_value(&json!(42)), json!({"integerValue": "42"}));
        assert_eq!(encode_value(&json!(1.5)), json!({"doubleValue": 1.5}));
        assert_eq!(encode_value(&json!("hi")), json!({"stringValue": "hi"}));
    }

    #[test]
    fn test_encode_nested() {
        let encoded = encode_value(&json!({"rooms": ["kitchen"], "floors": 2}));
        assert_eq!(
            encoded,
            json!({"mapValue": {"fields": {
                "rooms": {"arrayValue": {"values": [{"stringValue": "kitchen"}]}},
                "floors": {"integerValue": "2"}
            }}})
        );
    }

    #[test]
    fn test_empty_fields_encode_to_empty_map() {
        assert!(encode_fields(&Fields::new()).is_empty());
    }

    #[test]
    fn test_decode_document_fields() {
        let raw = json!({
            "name": {"stringValue": "Home"},
            "members": {"integerValue": "3"},
            "tags": {"arrayValue": {}},
            "meta": {"mapValue": {}},
            "created": {"timestampValue": "2024-01-01T00:00:00Z"}
        });
        let decoded = decode_fields(raw.as_object().unwrap()).unwrap();
        assert_eq!(
            Value::Object(decoded),
            json!({
                "name": "Home",
                "members": 3,
                "tags": [],
                "meta": {},
                "created": "2024-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn test_decode_unknown_type() {
        assert!(matches!(
            decode_value(&json!({"weirdValue": 1})),
            Err(StoreError::Parse(_))
        ));
        assert!(decode_value(&json!({"integerValue": "x"})).is_err());
    }
}
