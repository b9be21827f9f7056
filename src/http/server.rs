//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the index page and every connector route
//! - Wire up middleware (tracing, request ID, timeout, body limit, access control)
//! - Bind server to listener and serve until shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::connectors::{self, Registry};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::Envelope;
use crate::lifecycle::shutdown::until_shutdown;
use crate::observability::metrics;
use crate::security::{access_control_middleware, AccessControlState};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub registry: Arc<Registry>,
}

/// HTTP server hosting the connectors.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let registry = Arc::new(Registry::from_config(&config)?);
        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            registry,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let access = AccessControlState::new(config.security.api_keys.clone());
        let connector_routes = connectors::routes()
            .route_layer(middleware::from_fn_with_state(access, access_control_middleware));

        Router::new()
            .route("/", get(index))
            .merge(connector_routes)
            .fallback(not_found)
            .with_state(state)
            .layer(middleware::from_fn(track_requests))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(middleware::from_fn_with_state(
                Duration::from_secs(config.timeouts.request_secs),
                request_timeout,
            ))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id(req),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener until a
    /// signal arrives or `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            ia_delib = self.config.ia_delib.len(),
            keycloak = self.config.keycloak.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(until_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Index: crate version and configured instances.
async fn index(State(state): State<AppState>) -> Envelope {
    Envelope(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "instances": state.registry.instances(),
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "err": 1,
            "err_class": "not_found",
            "err_desc": "no such endpoint",
            "data": null,
        })),
    )
}

/// Abort requests running past `limit`, answering with the error envelope.
async fn request_timeout(State(limit): State<Duration>, req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path().to_string();
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_elapsed) => {
            tracing::warn!(path = %path, limit_secs = limit.as_secs(), "Request timed out");
            (
                StatusCode::REQUEST_TIMEOUT,
                Json(json!({
                    "err": 1,
                    "err_class": "timeout",
                    "err_desc": "request timed out",
                    "data": null,
                })),
            )
                .into_response()
        }
    }
}

/// Count every inbound request by matched route and status.
async fn track_requests(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    let status = response.status().as_u16();
    metrics::record_request(&method, &route, status, start);
    tracing::debug!(route = %route, status, elapsed_ms = start.elapsed().as_millis() as u64, "Request handled");
    response
}
