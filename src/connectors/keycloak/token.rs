//! Password-grant token acquisition.
//!
//! A fresh token is fetched for every admin call: no caching, no expiry
//! tracking, no refresh token.

use serde_json::Value;

use crate::config::KeycloakConfig;
use crate::connectors::error::{ConnectorError, ConnectorResult};
use crate::connectors::keycloak::CONNECTOR;
use crate::upstream::{Call, Credentials, UpstreamClient};

/// `{url}realms/{token_realm}/protocol/openid-connect/token`
pub fn token_url(config: &KeycloakConfig) -> String {
    format!(
        "{}realms/{}/protocol/openid-connect/token",
        config.url, config.token_realm
    )
}

/// Request an access token with the instance's admin credentials.
pub async fn fetch_access_token(client: &UpstreamClient, config: &KeycloakConfig) -> ConnectorResult<String> {
    let form = vec![
        ("client_id".to_string(), config.client_id.clone()),
        ("password".to_string(), config.password.clone()),
        ("grant_type".to_string(), "password".to_string()),
        ("username".to_string(), config.username.clone()),
    ];
    let body = client
        .execute(Call::post(token_url(config)).form(form), &Credentials::Anonymous)
        .await
        .and_then(|reply| reply.into_json())
        .map_err(ConnectorError::upstream(CONNECTOR))?;

    match body.get("access_token").and_then(Value::as_str) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => {
            tracing::warn!(
                connector = CONNECTOR,
                slug = %config.slug,
                "Token response has no access_token"
            );
            Err(ConnectorError::MissingAccessToken {
                connector: CONNECTOR,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String) -> KeycloakConfig {
        KeycloakConfig {
            slug: "sso".into(),
            title: None,
            url,
            username: "admin".into(),
            password: "s3cret".into(),
            client_id: "admin-cli".into(),
            token_realm: "master".into(),
        }
    }

    fn client() -> UpstreamClient {
        UpstreamClient::new(CONNECTOR, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_token_url() {
        let cfg = config("https://sso.example.org/".into());
        assert_eq!(
            token_url(&cfg),
            "https://sso.example.org/realms/master/protocol/openid-connect/token"
        );
    }

    #[tokio::test]
    async fn test_password_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/realms/master/protocol/openid-connect/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("client_id=admin-cli"))
            .and(body_string_contains("username=admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "eyJ.abc",
                "expires_in": 60
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = fetch_access_token(&client(), &config(format!("{}/", server.uri())))
            .await
            .unwrap();
        assert_eq!(token, "eyJ.abc");
    }

    #[tokio::test]
    async fn test_missing_access_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
            .mount(&server)
            .await;

        let err = fetch_access_token(&client(), &config(format!("{}/", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::MissingAccessToken { .. }));
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid user credentials"
            })))
            .mount(&server)
            .await;

        let err = fetch_access_token(&client(), &config(format!("{}/", server.uri())))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid_grant"));
    }
}
