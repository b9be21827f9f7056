//! iMio connector gateway: iA.Delib and Keycloak exposed as HTTP endpoints.

pub mod config;
pub mod connectors;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
