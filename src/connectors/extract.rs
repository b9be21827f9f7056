//! Turning inbound query strings and bodies into connector inputs, with
//! failures reported in the connector's own error format.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use serde_json::{Map, Value};

use crate::connectors::error::{ConnectorError, ConnectorResult};

/// Unwrap a query extraction, reporting missing parameters as bad requests.
pub fn query_params<T>(connector: &'static str, query: Result<Query<T>, QueryRejection>) -> ConnectorResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ConnectorError::bad_request(connector, rejection.body_text()))
}

/// Parse a request body that must be a JSON object.
pub fn json_object(connector: &'static str, body: &Bytes) -> ConnectorResult<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ConnectorError::bad_request(connector, "body must be a JSON object")),
        Err(e) => Err(ConnectorError::bad_request(connector, format!("body is not valid JSON: {e}"))),
    }
}

/// Check a caller-supplied value before it is spliced into an upstream
/// path: it must be a single, non-traversing segment. `%` is refused
/// outright since the upstream URL parser decodes `%2e%2e` back to `..`.
pub fn path_segment<'a>(connector: &'static str, name: &str, value: &'a str) -> ConnectorResult<&'a str> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '?', '#', '%']);
    if invalid {
        Err(ConnectorError::bad_request(connector, format!("invalid {name} '{value}'")))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment() {
        assert_eq!(path_segment("X", "realm", "imio").unwrap(), "imio");
        assert_eq!(
            path_segment("X", "user_id", "4d49f2eb-890d-47e9-8cb4-3910fc17b66b").unwrap(),
            "4d49f2eb-890d-47e9-8cb4-3910fc17b66b"
        );
        for bad in ["", "..", "a/b", "x?y=1", "frag#1", "%2e%2e", "%2E%2E", ".%2e", "a%2fb"] {
            assert!(path_segment("X", "realm", bad).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn test_json_object() {
        let map = json_object("X", &Bytes::from_static(br#"{"a": 1}"#)).unwrap();
        assert_eq!(map["a"], 1);

        let err = json_object("X", &Bytes::from_static(b"[1, 2]")).unwrap_err();
        assert_eq!(err.to_string(), "X Connector Error: body must be a JSON object");

        let err = json_object("X", &Bytes::from_static(b"{nope")).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
