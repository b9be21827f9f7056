//! Keycloak connector: users, groups, credentials and identity-provider
//! links through the admin REST API.
//!
//! Each operation fetches its own bearer token (see `token.rs`) and calls
//! `{url}admin/realms/{realm}/...`.

pub mod handlers;
pub mod token;

use serde_json::{json, Map, Value};

use crate::config::KeycloakConfig;
use crate::connectors::error::{ConnectorError, ConnectorResult};
use crate::connectors::extract::path_segment;
use crate::connectors::json::drop_falsy;
use crate::upstream::{Call, Credentials, Reply, UpstreamClient};

/// Display name, used in error messages and metrics.
pub const CONNECTOR: &str = "Keycloak";

/// One configured Keycloak instance.
#[derive(Debug)]
pub struct KeycloakConnector {
    config: KeycloakConfig,
    client: UpstreamClient,
}

impl KeycloakConnector {
    pub fn new(config: KeycloakConfig, client: UpstreamClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }

    /// Fetch a fresh admin token.
    pub async fn access_token(&self) -> ConnectorResult<String> {
        token::fetch_access_token(&self.client, &self.config).await
    }

    /// `{url}admin/realms/{realm}/{path}` with every segment checked.
    fn admin_url(&self, realm: &str, segments: &[(&str, &str)]) -> ConnectorResult<String> {
        let mut url = format!(
            "{}admin/realms/{}",
            self.config.url,
            path_segment(CONNECTOR, "realm", realm)?
        );
        for (name, value) in segments {
            url.push('/');
            // Literal segments carry an empty name.
            if name.is_empty() {
                url.push_str(value);
            } else {
                url.push_str(path_segment(CONNECTOR, name, value)?);
            }
        }
        Ok(url)
    }

    fn user_url(&self, realm: &str, user_id: &str, rest: &[(&str, &str)]) -> ConnectorResult<String> {
        let mut segments = vec![("", "users"), ("user_id", user_id)];
        segments.extend_from_slice(rest);
        self.admin_url(realm, &segments)
    }

    async fn admin_call(&self, call: Call) -> ConnectorResult<Reply> {
        let token = self.access_token().await?;
        self.client
            .execute(call, &Credentials::Bearer(token))
            .await
            .map_err(ConnectorError::upstream(CONNECTOR))
    }

    async fn admin_data(&self, call: Call) -> ConnectorResult<Value> {
        let reply = self.admin_call(call).await?;
        Ok(json!({ "data": reply.into_value() }))
    }

    pub async fn read_users(&self, realm: &str) -> ConnectorResult<Value> {
        let url = self.admin_url(realm, &[("", "users")])?;
        self.admin_data(Call::get(url)).await
    }

    pub async fn read_user_groups(&self, realm: &str, user_id: &str) -> ConnectorResult<Value> {
        let url = self.user_url(realm, user_id, &[("", "groups")])?;
        self.admin_data(Call::get(url)).await
    }

    pub async fn read_user_credentials(&self, realm: &str, user_id: &str) -> ConnectorResult<Value> {
        let url = self.user_url(realm, user_id, &[("", "credentials")])?;
        self.admin_data(Call::get(url)).await
    }

    pub async fn delete_user_credential(
        &self,
        realm: &str,
        user_id: &str,
        credential_id: &str,
    ) -> ConnectorResult<Value> {
        let url = self.user_url(realm, user_id, &[("", "credentials"), ("credential_id", credential_id)])?;
        self.admin_data(Call::delete(url)).await
    }

    /// Partial update; falsy top-level values are dropped first.
    pub async fn update_user(
        &self,
        realm: &str,
        user_id: &str,
        body: Map<String, Value>,
    ) -> ConnectorResult<Value> {
        let url = self.user_url(realm, user_id, &[])?;
        self.admin_data(Call::put(url).json(Value::Object(drop_falsy(body))))
            .await
    }

    /// Create a user in `realm`, and also in `central_realm` when given.
    ///
    /// Not atomic: the user created in `realm` is kept when the second
    /// creation fails, and the caller gets the second call's error.
    pub async fn create_user(
        &self,
        realm: &str,
        central_realm: Option<&str>,
        body: Map<String, Value>,
    ) -> ConnectorResult<Value> {
        let user = Value::Object(body);
        let url = self.admin_url(realm, &[("", "users")])?;
        let created = self.admin_call(Call::post(url).json(user.clone())).await?;
        tracing::info!(connector = CONNECTOR, realm = %realm, "User created");

        let Some(central) = central_realm else {
            return Ok(json!({ "data": created.into_value() }));
        };
        let url = self.admin_url(central, &[("", "users")])?;
        let mirrored = self
            .admin_call(Call::post(url).json(user))
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    connector = CONNECTOR,
                    realm = %realm,
                    central_realm = %central,
                    error = %e,
                    "User created in realm but not in central realm"
                )
            })?;
        tracing::info!(connector = CONNECTOR, realm = %central, "User created in central realm");

        Ok(json!({ "data": [created.into_value(), mirrored.into_value()] }))
    }

    pub async fn get_user_by_mail(&self, realm: &str, email: &str) -> ConnectorResult<Value> {
        let url = self.admin_url(realm, &[("", "users")])?;
        self.admin_data(Call::get(url).param("email", email)).await
    }

    pub async fn read_groups(&self, realm: &str) -> ConnectorResult<Value> {
        let url = self.admin_url(realm, &[("", "groups")])?;
        self.admin_data(Call::get(url)).await
    }

    pub async fn delete_user(&self, realm: &str, user_id: &str) -> ConnectorResult<Value> {
        let url = self.user_url(realm, user_id, &[])?;
        self.admin_data(Call::delete(url)).await
    }

    /// Link the user to an identity provider. `body` is forwarded as-is
    /// (`identityProvider`, `userId`, `userName`).
    pub async fn create_idp_link(
        &self,
        realm: &str,
        user_id: &str,
        provider_id: &str,
        body: Map<String, Value>,
    ) -> ConnectorResult<Value> {
        let url = self.user_url(realm, user_id, &[("", "federated-identity"), ("provider_id", provider_id)])?;
        self.admin_data(Call::post(url).json(Value::Object(body))).await
    }

    pub async fn get_idp_links(&self, realm: &str, user_id: &str) -> ConnectorResult<Value> {
        let url = self.user_url(realm, user_id, &[("", "federated-identity")])?;
        self.admin_data(Call::get(url)).await
    }

    pub async fn delete_idp_link(&self, realm: &str, user_id: &str, provider_id: &str) -> ConnectorResult<Value> {
        let url = self.user_url(realm, user_id, &[("", "federated-identity"), ("provider_id", provider_id)])?;
        self.admin_data(Call::delete(url)).await
    }

    pub async fn add_user_group(&self, realm: &str, user_id: &str, group_id: &str) -> ConnectorResult<Value> {
        let url = self.user_url(realm, user_id, &[("", "groups"), ("group_id", group_id)])?;
        self.admin_data(Call::put(url)).await
    }

    pub async fn delete_user_group(&self, realm: &str, user_id: &str, group_id: &str) -> ConnectorResult<Value> {
        let url = self.user_url(realm, user_id, &[("", "groups"), ("group_id", group_id)])?;
        self.admin_data(Call::delete(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn connector() -> KeycloakConnector {
        let config = KeycloakConfig {
            slug: "sso".into(),
            title: None,
            url: "https://sso.example.org/".into(),
            username: "admin".into(),
            password: "pw".into(),
            client_id: "admin-cli".into(),
            token_realm: "master".into(),
        };
        KeycloakConnector::new(config, UpstreamClient::new(CONNECTOR, Duration::from_secs(1)).unwrap())
    }

    #[test]
    fn test_admin_urls() {
        let kc = connector();
        assert_eq!(
            kc.admin_url("imio", &[("", "groups")]).unwrap(),
            "https://sso.example.org/admin/realms/imio/groups"
        );
        assert_eq!(
            kc.user_url("imio", "u-1", &[("", "federated-identity"), ("provider_id", "imio")])
                .unwrap(),
            "https://sso.example.org/admin/realms/imio/users/u-1/federated-identity/imio"
        );
        assert_eq!(
            kc.user_url("imio", "u-1", &[]).unwrap(),
            "https://sso.example.org/admin/realms/imio/users/u-1"
        );
    }

    #[test]
    fn test_traversal_is_rejected() {
        let kc = connector();
        assert!(kc.admin_url("../master", &[]).is_err());
        assert!(kc.user_url("imio", "..", &[]).is_err());
    }

    #[test]
    fn test_encoded_dot_segments_are_rejected() {
        let kc = connector();
        assert!(kc.user_url("imio", "%2e%2e", &[]).is_err());
        assert!(kc.user_url("imio", "%2E%2E", &[]).is_err());
        assert!(kc.admin_url("%2E%2E", &[("", "users")]).is_err());
        assert!(kc
            .user_url("imio", "u-1", &[("", "groups"), ("group_id", "%2e%2e")])
            .is_err());
    }
}
