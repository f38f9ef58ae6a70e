// src/memory/qdrant/mapping.rs

//! Maps between serde_json metadata values and Qdrant payload values for
//! point upserts/search.

use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{ListValue, Struct, Value};

/// Converts a serde_json value to a Qdrant payload value, nesting included.
pub fn json_to_payload_value(value: &serde_json::Value) -> Value {
    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Kind::IntegerValue(i)
            } else {
                Kind::DoubleValue(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Kind::StringValue(s.clone()),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.iter().map(json_to_payload_value).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_payload_value(v)))
                .collect(),
        }),
    };
    Value { kind: Some(kind) }
}

/// Converts a Qdrant payload value back to serde_json.
pub fn payload_value_to_json(value: &Value) -> serde_json::Value {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(*b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::Number((*i).into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(*d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.iter().map(payload_value_to_json).collect())
        }
        Some(Kind::StructValue(fields)) => serde_json::Value::Object(
            fields
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), payload_value_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_metadata_survives_the_mapping() {
        let original = json!({
            "author": "peter",
            "year": 2024,
            "score": 0.75,
            "tags": ["rust", "mcp"],
            "source": {"kind": "chat", "turn": 3}
        });
        let mapped = payload_value_to_json(&json_to_payload_value(&original));
        assert_eq!(mapped, original);
    }

    #[test]
    fn test_null_maps_to_null() {
        let mapped = payload_value_to_json(&json_to_payload_value(&serde_json::Value::Null));
        assert!(mapped.is_null());
    }
}
