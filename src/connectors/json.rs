//! Small helpers over `serde_json::Value`.

use serde_json::{Map, Value};

/// Truthiness as the upstream form system understands it: null, false,
/// zero, and empty strings, lists or objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Remove top-level entries whose value is falsy.
pub fn drop_falsy(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().filter(|(_, v)| is_truthy(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!(-2.5), json!("x"), json!([0]), json!({"a": null})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn test_drop_falsy_is_shallow() {
        let body = json!({
            "firstName": "Jane",
            "lastName": "",
            "enabled": false,
            "attributes": {"phone": ""},
            "groups": [],
        });
        let Value::Object(map) = body else { unreachable!() };
        let kept = Value::Object(drop_falsy(map));
        assert_eq!(kept, json!({"firstName": "Jane", "attributes": {"phone": ""}}));
    }
}
