//! Gateway-level behavior: index, API keys, request ids, fallbacks.

use passerelle_imio::config::GatewayConfig;
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::{delib_instance, keycloak_instance, start_gateway};

async fn mount_infos(upstream: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/@infos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "4.2"})))
        .mount(upstream)
        .await;
}

#[tokio::test]
async fn test_index_lists_instances() {
    let upstream = MockServer::start().await;
    let mut config = GatewayConfig::default();
    config.keycloak.push(keycloak_instance("sso", &upstream.uri()));
    config.ia_delib.push(delib_instance("conseil", &upstream.uri()));
    config.ia_delib.push(delib_instance("college", &upstream.uri()));
    let gateway = start_gateway(config).await;

    let res = gateway.client.get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["err"], 0);
    let listed: Vec<(String, String)> = body["instances"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| {
            (
                i["kind"].as_str().unwrap().to_string(),
                i["slug"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        listed,
        vec![
            ("ia-delib".to_string(), "college".to_string()),
            ("ia-delib".to_string(), "conseil".to_string()),
            ("keycloak".to_string(), "sso".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_describe_lists_endpoints() {
    let upstream = MockServer::start().await;
    let mut config = GatewayConfig::default();
    config.keycloak.push(keycloak_instance("sso", &upstream.uri()));
    let gateway = start_gateway(config).await;

    let res = gateway.client.get(gateway.url("/keycloak/sso/")).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "keycloak");
    let names: Vec<&str> = body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"create-user"));
    assert!(names.contains(&"get-user-by-mail"));
}

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let upstream = MockServer::start().await;
    mount_infos(&upstream).await;
    let mut config = GatewayConfig::default();
    config.security.api_keys = vec!["hub-key".to_string()];
    config.ia_delib.push(delib_instance("college", &upstream.uri()));
    let gateway = start_gateway(config).await;

    let res = gateway.client.get(gateway.url("/ia-delib/college/test")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["err_class"], "permission_denied");

    let res = gateway
        .client
        .get(gateway.url("/ia-delib/college/test"))
        .bearer_auth("wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = gateway
        .client
        .get(gateway.url("/ia-delib/college/test"))
        .bearer_auth("hub-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"version": "4.2", "err": 0}));
}

#[tokio::test]
async fn test_index_is_open_with_api_keys() {
    let mut config = GatewayConfig::default();
    config.security.api_keys = vec!["hub-key".to_string()];
    let gateway = start_gateway(config).await;

    let res = gateway.client.get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_generated_and_propagated() {
    let gateway = start_gateway(GatewayConfig::default()).await;

    let res = gateway.client.get(gateway.url("/")).send().await.unwrap();
    let generated = res.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let res = gateway
        .client
        .get(gateway.url("/"))
        .header("x-request-id", "caller-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "caller-42");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let gateway = start_gateway(GatewayConfig::default()).await;

    let res = gateway.client.get(gateway.url("/nope/here")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["err"], 1);
    assert_eq!(body["err_class"], "not_found");
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    // Bind and drop a listener to get a port nothing listens on.
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", closed.local_addr().unwrap());
    drop(closed);

    let mut config = GatewayConfig::default();
    config.ia_delib.push(delib_instance("college", &uri));
    let gateway = start_gateway(config).await;

    let res = gateway.client.get(gateway.url("/ia-delib/college/test")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["err_class"], "transport_error");
}

#[tokio::test]
async fn test_request_timeout_uses_error_envelope() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/@infos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"version": "4.2"}))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&upstream)
        .await;
    let mut config = GatewayConfig::default();
    config.timeouts.request_secs = 1;
    config.ia_delib.push(delib_instance("college", &upstream.uri()));
    let gateway = start_gateway(config).await;

    let res = gateway.client.get(gateway.url("/ia-delib/college/test")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["err"], 1);
    assert_eq!(body["err_class"], "timeout");
}
