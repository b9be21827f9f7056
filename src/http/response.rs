//! Response envelopes.
//!
//! # Responsibilities
//! - Wrap successful connector results (`err: 0`)
//! - Map connector errors to an HTTP status and error envelope (`err: 1`)
//!
//! # Design Decisions
//! - Upstream 4xx keep their status; everything else from upstream is 502
//! - Error bodies always carry a stable `err_class` and a readable `err_desc`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};

use crate::connectors::ConnectorError;
use crate::upstream::UpstreamError;

/// A successful connector result.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope(pub Value);

impl Envelope {
    /// Objects gain `"err": 0`; any other value is nested under `data`.
    pub fn into_value(self) -> Value {
        match self.0 {
            Value::Object(mut map) => {
                map.insert("err".to_string(), json!(0));
                Value::Object(map)
            }
            other => json!({ "err": 0, "data": other }),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        Json(self.into_value()).into_response()
    }
}

/// HTTP status surfaced for a connector error.
pub fn error_status(error: &ConnectorError) -> StatusCode {
    match error {
        ConnectorError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        ConnectorError::UnknownInstance { .. } => StatusCode::NOT_FOUND,
        ConnectorError::MissingAccessToken { .. } => StatusCode::BAD_GATEWAY,
        ConnectorError::Upstream { source, .. } => match source {
            UpstreamError::Status { status, .. } if status.is_client_error() => *status,
            _ => StatusCode::BAD_GATEWAY,
        },
    }
}

/// The error envelope body.
pub fn error_body(error: &ConnectorError) -> Value {
    let mut body = Map::new();
    body.insert("err".to_string(), json!(1));
    body.insert("err_class".to_string(), json!(error.class()));
    body.insert("err_desc".to_string(), json!(error.to_string()));
    body.insert("data".to_string(), Value::Null);
    Value::Object(body)
}

impl IntoResponse for ConnectorError {
    fn into_response(self) -> Response {
        let status = error_status(&self);
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self, "Connector call failed");
        } else {
            tracing::info!(status = %status, error = %self, "Connector call rejected");
        }
        (status, Json(error_body(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(code: u16) -> ConnectorError {
        ConnectorError::Upstream {
            connector: "iA.Delib",
            source: UpstreamError::Status {
                status: StatusCode::from_u16(code).unwrap(),
                url: "https://delib.example.org/@item".into(),
                body: Some(json!({"message": "nope"})),
            },
        }
    }

    #[test]
    fn test_envelope() {
        assert_eq!(
            Envelope(json!({"title": "Point"})).into_value(),
            json!({"title": "Point", "err": 0})
        );
        assert_eq!(Envelope(json!([1, 2])).into_value(), json!({"err": 0, "data": [1, 2]}));
        assert_eq!(Envelope(Value::Null).into_value(), json!({"err": 0, "data": null}));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(error_status(&status_error(404)), StatusCode::NOT_FOUND);
        assert_eq!(error_status(&status_error(500)), StatusCode::BAD_GATEWAY);
        assert_eq!(
            error_status(&ConnectorError::bad_request("Keycloak", "missing realm")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&ConnectorError::MissingAccessToken { connector: "Keycloak" }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_body() {
        let body = error_body(&status_error(500));
        assert_eq!(body["err"], json!(1));
        assert_eq!(body["err_class"], json!("status_error"));
        assert_eq!(body["data"], Value::Null);
        let desc = body["err_desc"].as_str().unwrap();
        assert!(desc.starts_with("iA.Delib Connector Error: 500 Internal Server Error"));
        assert!(desc.contains(r#"{"message":"nope"}"#));
    }
}
