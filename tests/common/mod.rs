//! Shared utilities for integration tests.

#![allow(dead_code)]

use passerelle_imio::config::{GatewayConfig, IaDelibConfig, KeycloakConfig};
use passerelle_imio::{HttpServer, Shutdown};
use tokio::net::TcpListener;

/// A gateway running on an ephemeral port.
pub struct Gateway {
    pub base: String,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the gateway with `config`. The listener is bound before this
/// returns, so requests can be sent right away.
pub async fn start_gateway(mut config: GatewayConfig) -> Gateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    Gateway {
        base: format!("http://{}", addr),
        client,
        shutdown,
    }
}

/// An iA.Delib instance named `slug` pointing at `upstream` (a mock server URI).
pub fn delib_instance(slug: &str, upstream: &str) -> IaDelibConfig {
    IaDelibConfig {
        slug: slug.to_string(),
        title: None,
        url: format!("{}/", upstream),
        username: "ws-user".to_string(),
        password: "ws-pass".to_string(),
    }
}

/// A Keycloak instance named `slug` pointing at `upstream`.
pub fn keycloak_instance(slug: &str, upstream: &str) -> KeycloakConfig {
    KeycloakConfig {
        slug: slug.to_string(),
        title: None,
        url: format!("{}/", upstream),
        username: "admin".to_string(),
        password: "admin-pass".to_string(),
        client_id: "admin-cli".to_string(),
        token_realm: "master".to_string(),
    }
}

/// `Authorization` value for the iA.Delib test credentials ("ws-user:ws-pass").
pub const DELIB_BASIC: &str = "Basic d3MtdXNlcjp3cy1wYXNz";
