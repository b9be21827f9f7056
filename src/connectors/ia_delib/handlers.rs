//! HTTP endpoints of the iA.Delib connector, mounted under
//! `/ia-delib/{slug}/`.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::connectors::catalog::{display_sorted, EndpointInfo, ParamInfo};
use crate::connectors::error::ConnectorResult;
use crate::connectors::extract::{json_object, query_params};
use crate::connectors::ia_delib::CONNECTOR;
use crate::http::response::Envelope;
use crate::http::server::AppState;

const CONFIG_ID: ParamInfo = ParamInfo {
    name: "config_id",
    description: "Identifiant de la config de l'instance iA.Delib",
    example_value: "meeting-config-college",
};

pub const ENDPOINTS: &[EndpointInfo] = &[
    EndpointInfo {
        name: "test",
        methods: &["get"],
        description: "Valider la connexion entre iA.Delib et Publik",
        long_description: "Vérifie les données de connexion aux Web Services et renvoie les versions installées.",
        display_category: "Test",
        display_order: 0,
        parameters: &[],
    },
    EndpointInfo {
        name: "read-item",
        methods: &["get"],
        description: "Récupérer un point",
        long_description: "Renvoie un point iA.Délib via son UID iA.Delib",
        display_category: "Récupération de point",
        display_order: 0,
        parameters: &[
            ParamInfo {
                name: "uid",
                description: "Identifiant d'un Point",
                example_value: "bce166cfb27946b58aff9ecfa27367fc",
            },
            CONFIG_ID,
        ],
    },
    EndpointInfo {
        name: "read-item-ts-id",
        methods: &["get"],
        description: "Récupérer un point avec un identifiant externe",
        long_description: "Renvoie un point iA.Délib en utilisant un identifiant externe",
        display_category: "Récupération de point",
        display_order: 1,
        parameters: &[
            ParamInfo {
                name: "external_id",
                description: "Identifiant TS d'un Point",
                example_value: "12-350",
            },
            CONFIG_ID,
        ],
    },
    EndpointInfo {
        name: "search-items",
        methods: &["get"],
        description: "Faire une recherche dans iA.Delib",
        long_description: "Transmet tous les paramètres à @search et renvoie une liste de points ou de séances.",
        display_category: "Récupération de point",
        display_order: 2,
        parameters: &[],
    },
    EndpointInfo {
        name: "create-item",
        methods: &["post"],
        description: "Créer un point dans iA.Délib",
        long_description: "Body nécessaire: config_id, proposingGroup, category, title, type. \
                           Body optionnel: motivation, decision, externalIdentifier, \
                           api_url avec simple_files, workflow_files, blocs_of_files.",
        display_category: "Création de point",
        display_order: 0,
        parameters: &[],
    },
    EndpointInfo {
        name: "add-annexes",
        methods: &["post"],
        description: "POST @annex sur un item iA.Delib",
        long_description: "Ajout de pièces jointes sur un élément existant via son UID. Body nécessaire: \
                           api_url, UID. Body optionnel: simple_files, workflow_files, blocs_of_files.",
        display_category: "Création de point",
        display_order: 1,
        parameters: &[],
    },
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ia-delib/{slug}/", get(describe))
        .route("/ia-delib/{slug}/test", get(test))
        .route("/ia-delib/{slug}/read-item", get(read_item))
        .route("/ia-delib/{slug}/read-item-ts-id", get(read_item_ts_id))
        .route("/ia-delib/{slug}/search-items", get(search_items))
        .route("/ia-delib/{slug}/create-item", post(create_item))
        .route("/ia-delib/{slug}/add-annexes", post(add_annexes))
}

#[derive(Debug, Deserialize)]
pub struct ReadItemParams {
    pub uid: String,
    pub config_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadItemTsIdParams {
    pub external_id: String,
    pub config_id: String,
}

async fn describe(State(state): State<AppState>, Path(slug): Path<String>) -> ConnectorResult<Envelope> {
    let connector = state.registry.ia_delib(&slug)?;
    let config = connector.config();
    Ok(Envelope(json!({
        "kind": "ia-delib",
        "slug": config.slug,
        "title": config.title.as_deref().unwrap_or(CONNECTOR),
        "endpoints": display_sorted(ENDPOINTS),
    })))
}

async fn test(State(state): State<AppState>, Path(slug): Path<String>) -> ConnectorResult<Envelope> {
    let connector = state.registry.ia_delib(&slug)?;
    connector.test().await.map(Envelope)
}

async fn read_item(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<ReadItemParams>, QueryRejection>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.ia_delib(&slug)?;
    let params = query_params(CONNECTOR, query)?;
    connector.read_item(&params.uid, &params.config_id).await.map(Envelope)
}

async fn read_item_ts_id(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<ReadItemTsIdParams>, QueryRejection>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.ia_delib(&slug)?;
    let params = query_params(CONNECTOR, query)?;
    connector
        .read_item_ts_id(&params.external_id, &params.config_id)
        .await
        .map(Envelope)
}

async fn search_items(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.ia_delib(&slug)?;
    let params = query_params(CONNECTOR, query)?;
    connector.search_items(params).await.map(Envelope)
}

async fn create_item(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Bytes,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.ia_delib(&slug)?;
    let post_data = json_object(CONNECTOR, &body)?;
    connector.create_item(post_data).await.map(Envelope)
}

async fn add_annexes(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Bytes,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.ia_delib(&slug)?;
    let post_data = json_object(CONNECTOR, &body)?;
    connector.add_annexes(post_data).await.map(Envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_matches_routes() {
        let names: Vec<_> = ENDPOINTS.iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec!["test", "read-item", "read-item-ts-id", "search-items", "create-item", "add-annexes"]
        );
    }
}
