//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the connector gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Access control and request limits.
    pub security: SecurityConfig,

    /// iA.Delib connector instances.
    pub ia_delib: Vec<IaDelibConfig>,

    /// Keycloak connector instances.
    pub keycloak: Vec<KeycloakConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Inbound request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// API keys granting access to connector endpoints (Bearer token).
    /// Empty means open access.
    pub api_keys: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            max_body_size: 16 * 1024 * 1024, // annexes travel as base64
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("api_keys", &format_args!("[{} key(s)]", self.api_keys.len()))
            .field("max_body_size", &self.max_body_size)
            .finish()
    }
}

/// An iA.Delib connector instance.
#[derive(Clone, Deserialize, Serialize)]
pub struct IaDelibConfig {
    /// Instance identifier used in routes.
    pub slug: String,

    /// Human readable title.
    #[serde(default)]
    pub title: Option<String>,

    /// Base URL of the iA.Delib application, with a trailing slash.
    pub url: String,

    /// HTTP Basic username.
    #[serde(default)]
    pub username: String,

    /// HTTP Basic password.
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for IaDelibConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IaDelibConfig")
            .field("slug", &self.slug)
            .field("title", &self.title)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A Keycloak connector instance.
#[derive(Clone, Deserialize, Serialize)]
pub struct KeycloakConfig {
    /// Instance identifier used in routes.
    pub slug: String,

    /// Human readable title.
    #[serde(default)]
    pub title: Option<String>,

    /// Base URL of the Keycloak server, with a trailing slash.
    pub url: String,

    /// Admin account username (password grant).
    #[serde(default)]
    pub username: String,

    /// Admin account password (password grant).
    #[serde(default)]
    pub password: String,

    /// OpenID client used for the password grant.
    #[serde(default)]
    pub client_id: String,

    /// Realm holding the admin account.
    #[serde(default = "default_token_realm")]
    pub token_realm: String,
}

fn default_token_realm() -> String {
    "master".to_string()
}

impl std::fmt::Debug for KeycloakConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakConfig")
            .field("slug", &self.slug)
            .field("title", &self.title)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("client_id", &self.client_id)
            .field("token_realm", &self.token_realm)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.ia_delib.is_empty());
        assert!(config.security.api_keys.is_empty());
    }

    #[test]
    fn test_connector_instances_parse() {
        let raw = r#"
            [observability]
            log_format = "json"

            [[ia_delib]]
            slug = "delib-college"
            url = "https://delib.example.org/"
            username = "ws"
            password = "secret"

            [[keycloak]]
            slug = "central"
            url = "https://sso.example.org/"
            client_id = "admin-cli"
        "#;
        let config: GatewayConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.ia_delib[0].slug, "delib-college");
        assert_eq!(config.keycloak[0].token_realm, "master");
    }

    #[test]
    fn test_debug_hides_password() {
        let config = IaDelibConfig {
            slug: "d".into(),
            title: None,
            url: "https://delib.example.org/".into(),
            username: "ws".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }
}
