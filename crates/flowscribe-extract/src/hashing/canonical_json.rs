//! Canonical JSON: object keys sorted, no insignificant whitespace.

use std::collections::BTreeMap;

use serde_json::Value;

pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(_) => value.to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let sorted: BTreeMap<&String, String> =
                map.iter().map(|(k, v)| (k, to_canonical_json(v))).collect();
            let items: Vec<String> = sorted
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), v))
                .collect();
            format!("{{{}}}", items.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_keys_sorted_at_every_level() {
        let value = json!({"b": 1, "a": {"z": true, "m": null}});
        assert_eq!(to_canonical_json(&value), r#"{"a":{"m":null,"z":true},"b":1}"#);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut first = serde_json::Map::new();
        first.insert("title".into(), json!("Send email"));
        first.insert("order".into(), json!(3));
        let mut second = serde_json::Map::new();
        second.insert("order".into(), json!(3));
        second.insert("title".into(), json!("Send email"));

        assert_eq!(
            to_canonical_json(&Value::Object(first)),
            to_canonical_json(&Value::Object(second))
        );
    }

    #[test]
    fn test_arrays_keep_order_and_strings_escape() {
        let value = json!(["b", "a\"q", 1.5]);
        assert_eq!(to_canonical_json(&value), r#"["b","a\"q",1.5]"#);
    }
}
