//! The single request-execution helper shared by every connector endpoint.
//!
//! # Responsibilities
//! - Attach credentials (Basic or Bearer) to an outbound call
//! - Send it and read the whole body
//! - Classify the reply: success, transport error, decode error, status error
//! - Log and count each outcome
//!
//! # Design Decisions
//! - Decode is checked before status: a failing reply whose body is not
//!   JSON is a decode error
//! - An empty body is not a decode error (Keycloak answers 201/204 empty)
//! - No retries, no backoff

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::observability::metrics;
use crate::upstream::error::UpstreamError;

/// How an outbound call authenticates.
#[derive(Clone)]
pub enum Credentials {
    Anonymous,
    Basic { username: String, password: String },
    Bearer(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Basic { username, .. } => {
                f.debug_struct("Basic").field("username", username).finish_non_exhaustive()
            }
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

/// Outbound request body.
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    Json(Value),
    Form(Vec<(String, String)>),
    Raw { content_type: &'static str, bytes: Vec<u8> },
}

/// One outbound call: method, URL, query and payload.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub payload: Payload,
}

impl Call {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            payload: Payload::None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Append one query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters, keeping their order.
    pub fn params<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.payload = Payload::Json(body);
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.payload = Payload::Form(pairs);
        self
    }

    /// Forward an already-encoded JSON body untouched.
    pub fn raw_json(mut self, bytes: Vec<u8>) -> Self {
        self.payload = Payload::Raw {
            content_type: "application/json",
            bytes,
        };
        self
    }
}

/// A successful reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    /// Parsed body; `None` when the upstream sent nothing.
    pub body: Option<Value>,
}

impl Reply {
    /// The JSON body, failing as a decode error when the reply was empty.
    pub fn into_json(self) -> Result<Value, UpstreamError> {
        self.body.ok_or(UpstreamError::Decode {
            status: self.status,
        })
    }

    /// The JSON body, or `null` when the reply was empty.
    pub fn into_value(self) -> Value {
        self.body.unwrap_or(Value::Null)
    }
}

/// HTTP client shared by all instances of one connector kind.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    connector: &'static str,
}

impl UpstreamClient {
    /// Build a client for `connector` (used as log and metric label).
    pub fn new(connector: &'static str, connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .user_agent(concat!("passerelle-imio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, connector })
    }

    pub fn connector(&self) -> &'static str {
        self.connector
    }

    /// Perform `call` with `credentials` and classify the reply.
    pub async fn execute(&self, call: Call, credentials: &Credentials) -> Result<Reply, UpstreamError> {
        let start = Instant::now();
        let result = self.send(call, credentials).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        metrics::record_upstream(self.connector, outcome, start);
        result
    }

    async fn send(&self, call: Call, credentials: &Credentials) -> Result<Reply, UpstreamError> {
        tracing::debug!(
            connector = self.connector,
            method = %call.method,
            url = %call.url,
            "Calling upstream"
        );

        let mut request = self.http.request(call.method.clone(), &call.url);
        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        request = match credentials {
            Credentials::Anonymous => request,
            Credentials::Basic { username, password } => request.basic_auth(username, Some(password)),
            Credentials::Bearer(token) => request.bearer_auth(token),
        };
        request = match call.payload {
            Payload::None => request,
            Payload::Json(body) => request.json(&body),
            Payload::Form(pairs) => request.form(&pairs),
            Payload::Raw { content_type, bytes } => request.header(CONTENT_TYPE, content_type).body(bytes),
        };

        let response = request.send().await.map_err(|e| {
            tracing::warn!(connector = self.connector, url = %call.url, error = %e, "Upstream unreachable");
            UpstreamError::Transport(e)
        })?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            tracing::warn!(connector = self.connector, url = %call.url, error = %e, "Upstream body lost");
            UpstreamError::Transport(e)
        })?;

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(
                        connector = self.connector,
                        url = %call.url,
                        status = %status,
                        error = %e,
                        "Upstream sent a non-JSON body"
                    );
                    return Err(UpstreamError::Decode { status });
                }
            }
        };

        if !status.is_success() {
            tracing::warn!(
                connector = self.connector,
                url = %call.url,
                status = %status,
                body = ?body,
                "Upstream rejected the call"
            );
            return Err(UpstreamError::Status {
                status,
                url: call.url,
                body,
            });
        }

        Ok(Reply { status, body })
    }
}
