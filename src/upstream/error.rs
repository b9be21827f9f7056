//! Outbound call failures.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Why a call to a wrapped API failed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection, TLS or body transfer failed.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The reply body is not JSON.
    #[error("bad JSON response")]
    Decode { status: StatusCode },

    /// The reply is JSON (or empty) but the status is not 2xx.
    #[error("{status} for url: {url} {}", render_body(.body))]
    Status {
        status: StatusCode,
        url: String,
        body: Option<Value>,
    },
}

fn render_body(body: &Option<Value>) -> String {
    match body {
        Some(value) => value.to_string(),
        None => "(empty body)".to_string(),
    }
}

impl UpstreamError {
    /// Short label used for metrics and log fields.
    pub fn outcome(&self) -> &'static str {
        match self {
            UpstreamError::Transport(_) => "transport_error",
            UpstreamError::Decode { .. } => "decode_error",
            UpstreamError::Status { .. } => "status_error",
        }
    }

    /// Upstream status, when a reply was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Transport(e) => e.status(),
            UpstreamError::Decode { status } => Some(*status),
            UpstreamError::Status { status, .. } => Some(*status),
        }
    }
}
