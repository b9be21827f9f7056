//! iA.Delib connector: deliberation items and their annexes.
//!
//! Every call authenticates with HTTP Basic using the instance's stored
//! credentials. Paths are appended to the configured base URL.

pub mod annexes;
pub mod handlers;

use serde_json::{json, Map, Value};

use crate::config::IaDelibConfig;
use crate::connectors::error::{ConnectorError, ConnectorResult};
use crate::connectors::extract::path_segment;
use crate::upstream::{Call, Credentials, UpstreamClient, UpstreamError};

use self::annexes::{attach_children, collect_annexes, Annex, FileSelectors};

/// Display name, used in error messages and metrics.
pub const CONNECTOR: &str = "iA.Delib";

/// One configured iA.Delib instance.
#[derive(Debug)]
pub struct IaDelibConnector {
    config: IaDelibConfig,
    client: UpstreamClient,
    credentials: Credentials,
}

impl IaDelibConnector {
    pub fn new(config: IaDelibConfig, client: UpstreamClient) -> Self {
        let credentials = Credentials::Basic {
            username: config.username.clone(),
            password: config.password.clone(),
        };
        Self {
            config,
            client,
            credentials,
        }
    }

    pub fn config(&self) -> &IaDelibConfig {
        &self.config
    }

    fn endpoint_url(&self, suffix: &str) -> String {
        format!("{}{}", self.config.url, suffix)
    }

    async fn fetch_json(&self, call: Call) -> ConnectorResult<Value> {
        self.client
            .execute(call, &self.credentials)
            .await
            .and_then(|reply| reply.into_json())
            .map_err(ConnectorError::upstream(CONNECTOR))
    }

    /// Connectivity check: `@infos`.
    pub async fn test(&self) -> ConnectorResult<Value> {
        self.fetch_json(Call::get(self.endpoint_url("@infos"))).await
    }

    /// Fetch an item by its iA.Delib UID.
    pub async fn read_item(&self, uid: &str, config_id: &str) -> ConnectorResult<Value> {
        let call = Call::get(self.endpoint_url("@item"))
            .param("UID", uid)
            .param("config_id", config_id);
        self.fetch_json(call).await
    }

    /// Fetch items by their external (TS) identifier.
    pub async fn read_item_ts_id(&self, external_id: &str, config_id: &str) -> ConnectorResult<Value> {
        let call = Call::get(self.endpoint_url("@search"))
            .param("externalIdentifier", external_id)
            .param("config_id", config_id);
        self.fetch_json(call).await
    }

    /// Free search; every parameter is forwarded as-is.
    pub async fn search_items(&self, params: Vec<(String, String)>) -> ConnectorResult<Value> {
        self.fetch_json(Call::get(self.endpoint_url("@search")).params(params))
            .await
    }

    /// Create an item, embedding annexes taken from the demand at `api_url`.
    pub async fn create_item(&self, mut post_data: Map<String, Value>) -> ConnectorResult<Value> {
        let annexes = self.demand_annexes(&post_data).await?;
        attach_children(&mut post_data, &annexes)
            .map_err(|e| ConnectorError::bad_request(CONNECTOR, e.to_string()))?;

        tracing::info!(
            connector = CONNECTOR,
            slug = %self.config.slug,
            annexes = annexes.len(),
            "Creating item"
        );
        self.fetch_json(Call::post(self.endpoint_url("@item")).json(Value::Object(post_data)))
            .await
    }

    /// Post each annex of the demand to an existing item, one call per
    /// annex. `data` holds one entry per answered annex: the created
    /// annex, or iA.Delib's error body when it refused it. Annexes that got
    /// no usable answer (transport or decode failure) are logged and skipped.
    pub async fn add_annexes(&self, post_data: Map<String, Value>) -> ConnectorResult<Value> {
        let uid = match post_data.get("UID") {
            Some(Value::String(uid)) => path_segment(CONNECTOR, "UID", uid)?.to_string(),
            _ => return Err(ConnectorError::bad_request(CONNECTOR, "missing UID")),
        };
        let url = self.endpoint_url(&format!("@annex/{uid}"));

        let annexes = self.demand_annexes(&post_data).await?;
        if annexes.is_empty() {
            return Ok(json!({ "data": [] }));
        }

        let titles: Vec<&str> = annexes.iter().map(|a| a.title.as_str()).collect();
        tracing::info!(connector = CONNECTOR, uid = %uid, files = ?titles, "Sending annexes");

        let mut responses = Vec::with_capacity(annexes.len());
        for annex in &annexes {
            tracing::info!(connector = CONNECTOR, uid = %uid, title = %annex.title, "Sending annex");
            let body = match serde_json::to_value(annex) {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(title = %annex.title, error = %e, "Annex not serializable");
                    continue;
                }
            };
            let result = self
                .client
                .execute(Call::post(url.clone()).json(body), &self.credentials)
                .await
                .and_then(|reply| reply.into_json());
            match result {
                Ok(response) => responses.push(response),
                // A rejection with a body is reported back in place of the annex.
                Err(UpstreamError::Status {
                    status,
                    body: Some(body),
                    ..
                }) => {
                    tracing::error!(title = %annex.title, status = %status, body = %body, "Annex rejected");
                    responses.push(body);
                }
                Err(e) => tracing::error!(title = %annex.title, error = %e, "Annex upload failed"),
            }
        }
        Ok(json!({ "data": responses }))
    }

    /// Fetch the demand referenced by `api_url` and assemble its annexes.
    /// No selector key means no annexes and no fetch.
    async fn demand_annexes(&self, post_data: &Map<String, Value>) -> ConnectorResult<Vec<Annex>> {
        let selectors = FileSelectors::from_post_data(post_data)
            .map_err(|e| ConnectorError::bad_request(CONNECTOR, format!("invalid file selectors: {e}")))?;
        let Some(selectors) = selectors else {
            return Ok(Vec::new());
        };

        let api_url = match post_data.get("api_url") {
            Some(Value::String(url)) if !url.is_empty() => url.clone(),
            _ => return Err(ConnectorError::bad_request(CONNECTOR, "missing api_url")),
        };
        // The demand lives on the form server; the instance's own
        // credentials are used, never the caller's.
        let demand = self.fetch_json(Call::get(api_url)).await?;

        collect_annexes(&selectors, &demand).map_err(|e| ConnectorError::bad_request(CONNECTOR, e.to_string()))
    }
}
