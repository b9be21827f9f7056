//! Connector subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request /{kind}/{slug}/{endpoint}
//!     → handlers.rs (extract slug, query, body)
//!     → Registry (slug → connector instance)
//!     → connector operation (reshape parameters)
//!     → upstream::UpstreamClient (one call or more)
//!     → reshape reply → Envelope | ConnectorError
//! ```
//!
//! # Design Decisions
//! - Instances are built once from config and shared read-only
//! - One `UpstreamClient` per connector kind, shared by its instances
//! - No state survives a request

pub mod catalog;
pub mod error;
pub mod extract;
pub mod ia_delib;
pub mod json;
pub mod keycloak;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use serde::Serialize;

use crate::config::GatewayConfig;
use crate::http::server::AppState;
use crate::upstream::UpstreamClient;

pub use error::{ConnectorError, ConnectorResult};
pub use ia_delib::IaDelibConnector;
pub use keycloak::KeycloakConnector;

/// Summary of one configured instance, for the index page.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceSummary {
    pub kind: &'static str,
    pub slug: String,
    pub title: String,
    pub url: String,
}

/// All configured connector instances, by slug.
#[derive(Debug, Default)]
pub struct Registry {
    ia_delib: BTreeMap<String, Arc<IaDelibConnector>>,
    keycloak: BTreeMap<String, Arc<KeycloakConnector>>,
}

impl Registry {
    /// Build every instance declared in `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let connect_timeout = Duration::from_secs(config.timeouts.connect_secs);
        let delib_client = UpstreamClient::new(ia_delib::CONNECTOR, connect_timeout)?;
        let keycloak_client = UpstreamClient::new(keycloak::CONNECTOR, connect_timeout)?;

        let ia_delib = config
            .ia_delib
            .iter()
            .map(|c| {
                let connector = IaDelibConnector::new(c.clone(), delib_client.clone());
                (c.slug.clone(), Arc::new(connector))
            })
            .collect();
        let keycloak = config
            .keycloak
            .iter()
            .map(|c| {
                let connector = KeycloakConnector::new(c.clone(), keycloak_client.clone());
                (c.slug.clone(), Arc::new(connector))
            })
            .collect();

        Ok(Self { ia_delib, keycloak })
    }

    pub fn ia_delib(&self, slug: &str) -> ConnectorResult<Arc<IaDelibConnector>> {
        self.ia_delib
            .get(slug)
            .cloned()
            .ok_or_else(|| ConnectorError::UnknownInstance {
                connector: ia_delib::CONNECTOR,
                slug: slug.to_string(),
            })
    }

    pub fn keycloak(&self, slug: &str) -> ConnectorResult<Arc<KeycloakConnector>> {
        self.keycloak
            .get(slug)
            .cloned()
            .ok_or_else(|| ConnectorError::UnknownInstance {
                connector: keycloak::CONNECTOR,
                slug: slug.to_string(),
            })
    }

    /// Every instance, iA.Delib first, each kind sorted by slug.
    pub fn instances(&self) -> Vec<InstanceSummary> {
        let delib = self.ia_delib.values().map(|c| {
            let config = c.config();
            InstanceSummary {
                kind: "ia-delib",
                slug: config.slug.clone(),
                title: config.title.clone().unwrap_or_else(|| ia_delib::CONNECTOR.to_string()),
                url: config.url.clone(),
            }
        });
        let keycloak = self.keycloak.values().map(|c| {
            let config = c.config();
            InstanceSummary {
                kind: "keycloak",
                slug: config.slug.clone(),
                title: config.title.clone().unwrap_or_else(|| keycloak::CONNECTOR.to_string()),
                url: config.url.clone(),
            }
        });
        delib.chain(keycloak).collect()
    }
}

/// Routes of every connector kind.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(ia_delib::handlers::routes())
        .merge(keycloak::handlers::routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IaDelibConfig, KeycloakConfig};

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.ia_delib.push(IaDelibConfig {
            slug: "college".into(),
            title: Some("Collège communal".into()),
            url: "https://delib.example.org/".into(),
            username: "ws".into(),
            password: "pw".into(),
        });
        config.keycloak.push(KeycloakConfig {
            slug: "central".into(),
            title: None,
            url: "https://sso.example.org/".into(),
            username: "admin".into(),
            password: "pw".into(),
            client_id: "admin-cli".into(),
            token_realm: "master".into(),
        });
        config
    }

    #[test]
    fn test_lookup_by_slug() {
        let registry = Registry::from_config(&config()).unwrap();
        assert!(registry.ia_delib("college").is_ok());
        assert!(registry.keycloak("central").is_ok());

        let err = registry.ia_delib("central").unwrap_err();
        assert!(matches!(err, ConnectorError::UnknownInstance { .. }));
        assert_eq!(err.to_string(), "no iA.Delib connector named 'central'");
    }

    #[test]
    fn test_instances_summary() {
        let registry = Registry::from_config(&config()).unwrap();
        let instances = registry.instances();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].kind, "ia-delib");
        assert_eq!(instances[0].title, "Collège communal");
        assert_eq!(instances[1].title, "Keycloak");
    }
}
