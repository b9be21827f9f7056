//! Access control middleware.
//! Only callers holding a configured API key may use connector endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// State required for access control.
#[derive(Clone, Debug)]
pub struct AccessControlState {
    pub api_keys: Arc<Vec<String>>,
}

impl AccessControlState {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: Arc::new(api_keys),
        }
    }

    /// No keys configured: every caller is allowed.
    pub fn is_open(&self) -> bool {
        self.api_keys.is_empty()
    }

    pub fn allows(&self, authorization: Option<&str>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(key) = authorization.and_then(|value| value.strip_prefix("Bearer ")) else {
            return false;
        };
        self.api_keys.iter().any(|allowed| constant_time_eq(allowed.as_bytes(), key.as_bytes()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn access_control_middleware(
    State(state): State<AccessControlState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let authorization = req.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok());
    if state.allows(authorization) {
        return next.run(req).await;
    }

    tracing::info!(path = %req.uri().path(), "Rejected request without a valid API key");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "err": 1,
            "err_class": "permission_denied",
            "err_desc": "missing or invalid API key",
            "data": null,
        })),
    )
        .into_response()
}
