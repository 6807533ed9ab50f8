//! Codec between plain JSON and Firestore's typed wire values.
//!
//! The REST API wraps every field in a type discriminator
//! (`{"stringValue": "x"}`, `{"mapValue": {"fields": {..}}}`, ...). The rest
//! of the crate works in `serde_json::Value`; only this module knows the
//! wire form.
//!
//! Integers ride as decimal strings on the wire (Firestore's `integerValue`
//! is 64-bit and JSON numbers are not), so the decode path parses them back.

use serde_json::{Map, Value, json};

/// Encode a plain JSON value into a Firestore typed value.
#[must_use]
pub fn to_firestore(value: &Value) -> Value {
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
        Value::Array(items) => json!({
            "arrayValue": {
                "values": items.iter().map(to_firestore).collect::<Vec<_>>()
            }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode a JSON object's entries as a Firestore `fields` map.
#[must_use]
pub fn encode_fields(map: &Map<String, Value>) -> Value {
    let fields: Map<String, Value> = map
        .iter()
        .map(|(k, v)| (k.clone(), to_firestore(v)))
        .collect();
    Value::Object(fields)
}

/// Decode a Firestore typed value into plain JSON.
///
/// Unknown discriminators decode to `null` rather than failing; the mirror
/// documents only ever hold the scalar/array/map subset we encode.
#[must_use]
pub fn from_firestore(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };

    if obj.contains_key("nullValue") {
        return Value::Null;
    }
    if let Some(b) = obj.get("booleanValue") {
        return b.clone();
    }
    if let Some(i) = obj.get("integerValue") {
        // Wire form is a decimal string
        if let Some(parsed) = i.as_str().and_then(|s| s.parse::<i64>().ok()) {
            return json!(parsed);
        }
        return i.clone();
    }
    if let Some(d) = obj.get("doubleValue") {
        return d.clone();
    }
    if let Some(s) = obj.get("stringValue") {
        return s.clone();
    }
    // Timestamps and references decode as their string form
    if let Some(t) = obj.get("timestampValue") {
        return t.clone();
    }
    if let Some(r) = obj.get("referenceValue") {
        return r.clone();
    }
    if let Some(arr) = obj.get("arrayValue") {
        let values = arr
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(from_firestore).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(map) = obj.get("mapValue") {
        return decode_fields(map.get("fields").unwrap_or(&Value::Null));
    }

    Value::Null
}

/// Decode a Firestore `fields` map into a JSON object.
#[must_use]
pub fn decode_fields(fields: &Value) -> Value {
    let Some(map) = fields.as_object() else {
        return Value::Object(Map::new());
    };

    let decoded: Map<String, Value> = map
        .iter()
        .map(|(k, v)| (k.clone(), from_firestore(v)))
        .collect();
    Value::Object(decoded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_roundtrip() {
        for value in [
            json!(null),
            json!(true),
            json!(42),
            json!(-7),
            json!(99.99),
            json!("hello"),
        ] {
            assert_eq!(from_firestore(&to_firestore(&value)), value);
        }
    }

    #[test]
    fn test_integer_rides_as_string() {
        let encoded = to_firestore(&json!(3));
        assert_eq!(encoded, json!({ "integerValue": "3" }));
    }

    #[test]
    fn test_cart_document_roundtrip() {
        let doc = json!({
            "items": [
                {
                    "id": "3",
                    "name": "Running Shoes",
                    "price": 79.99,
                    "quantity": 2,
                    "size": "M",
                    "color": "Black"
                }
            ]
        });

        let encoded = encode_fields(doc.as_object().unwrap());
        assert_eq!(decode_fields(&encoded), doc);
    }

    #[test]
    fn test_nested_map_roundtrip() {
        let value = json!({ "a": { "b": [1, "two", false, null] } });
        let encoded = encode_fields(value.as_object().unwrap());
        assert_eq!(decode_fields(&encoded), value);
    }

    #[test]
    fn test_timestamp_decodes_to_string() {
        let wire = json!({ "timestampValue": "2026-01-15T10:00:00Z" });
        assert_eq!(from_firestore(&wire), json!("2026-01-15T10:00:00Z"));
    }

    #[test]
    fn test_unknown_discriminator_decodes_to_null() {
        let wire = json!({ "geoPointValue": { "latitude": 0, "longitude": 0 } });
        assert_eq!(from_firestore(&wire), Value::Null);
    }
}
