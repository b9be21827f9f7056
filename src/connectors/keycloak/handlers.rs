//! HTTP endpoints of the Keycloak connector, mounted under
//! `/keycloak/{slug}/`.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::connectors::catalog::{display_sorted, EndpointInfo, ParamInfo};
use crate::connectors::error::ConnectorResult;
use crate::connectors::extract::{json_object, query_params};
use crate::connectors::keycloak::CONNECTOR;
use crate::http::response::Envelope;
use crate::http::server::AppState;

const REALM: ParamInfo = ParamInfo {
    name: "realm",
    description: "Tenant Keycloak/Collectivité",
    example_value: "imio",
};

const USER_ID: ParamInfo = ParamInfo {
    name: "user_id",
    description: "GUID de l'utilisateur",
    example_value: "4d49f2eb-890d-47e9-8cb4-3910fc17b66b",
};

const GROUP_ID: ParamInfo = ParamInfo {
    name: "group_id",
    description: "GUID du groupe",
    example_value: "ab220bdb-a4b7-4090-b631-0c6abea09293",
};

const PROVIDER_ID: ParamInfo = ParamInfo {
    name: "provider_id",
    description: "ID du fournisseur",
    example_value: "imio",
};

pub const ENDPOINTS: &[EndpointInfo] = &[
    EndpointInfo {
        name: "get-bearer-token",
        methods: &["get"],
        description: "Récupérer le Bearer Token",
        long_description: "Récupérer le Bearer Token.",
        display_category: "Access",
        display_order: 1,
        parameters: &[],
    },
    EndpointInfo {
        name: "read-users",
        methods: &["get"],
        description: "Récupérer la liste des users d'un realm",
        long_description: "Récupérer la liste des users pour un realm donné",
        display_category: "User",
        display_order: 1,
        parameters: &[REALM],
    },
    EndpointInfo {
        name: "read-user-groups",
        methods: &["get"],
        description: "Récupérer la liste de groupe d'un user",
        long_description: "Récupérer la liste de groupe d'un user",
        display_category: "User",
        display_order: 2,
        parameters: &[REALM, USER_ID],
    },
    EndpointInfo {
        name: "read-user-credentials",
        methods: &["get"],
        description: "Récupérer les types de connexion d'un utilisateur",
        long_description: "Récupérer les types de connexion d'un utilisateur",
        display_category: "User",
        display_order: 3,
        parameters: &[REALM, USER_ID],
    },
    EndpointInfo {
        name: "delete-user-credential",
        methods: &["get"],
        description: "Supprimer un type de connexion d'un utilisateur",
        long_description: "Supprimer un type de connexion d'un utilisateur",
        display_category: "User",
        display_order: 4,
        parameters: &[
            REALM,
            USER_ID,
            ParamInfo {
                name: "credential_id",
                description: "GUID du credential",
                example_value: "98e95a9c-236d-4d1b-af70-e90a95248ecc",
            },
        ],
    },
    EndpointInfo {
        name: "update-user",
        methods: &["post"],
        description: "Mettre à jour un utilisateur",
        long_description: "Les valeurs vides du body ne sont pas transmises.",
        display_category: "User",
        display_order: 5,
        parameters: &[REALM, USER_ID],
    },
    EndpointInfo {
        name: "create-user",
        methods: &["post"],
        description: "Créer un utilisateur",
        long_description: "Créer un utilisateur, et aussi dans central_realm si renseigné.",
        display_category: "User",
        display_order: 6,
        parameters: &[
            REALM,
            ParamInfo {
                name: "central_realm",
                description: "Realm central où dupliquer l'utilisateur (optionnel)",
                example_value: "central",
            },
        ],
    },
    EndpointInfo {
        name: "get-user-by-mail",
        methods: &["get"],
        description: "Récupérer un utilisateur via son adresse mail",
        long_description: "Aussi disponible sous le nom read-user-by-mail.",
        display_category: "User",
        display_order: 7,
        parameters: &[
            REALM,
            ParamInfo {
                name: "email",
                description: "mail de l'utilisateur",
                example_value: "agent@commune.be",
            },
        ],
    },
    EndpointInfo {
        name: "delete-user",
        methods: &["delete"],
        description: "Supprimer un utilisateur d'un realm",
        long_description: "Supprimer un utilisateur d'un realm",
        display_category: "User",
        display_order: 8,
        parameters: &[REALM, USER_ID],
    },
    EndpointInfo {
        name: "add-user-group",
        methods: &["post"],
        description: "Ajouter un utilisateur dans un groupe",
        long_description: "Ajouter un utilisateur dans un groupe",
        display_category: "User",
        display_order: 9,
        parameters: &[REALM, USER_ID, GROUP_ID],
    },
    EndpointInfo {
        name: "delete-user-group",
        methods: &["get"],
        description: "Supprimer l'utilisateur d'un groupe",
        long_description: "Supprimer l'utilisateur d'un groupe",
        display_category: "User",
        display_order: 10,
        parameters: &[REALM, USER_ID, GROUP_ID],
    },
    EndpointInfo {
        name: "read-groups",
        methods: &["get"],
        description: "Récupérer la liste des groupes d'un realm",
        long_description: "Récupérer la liste des groupes pour un realm donné",
        display_category: "Group",
        display_order: 0,
        parameters: &[REALM],
    },
    EndpointInfo {
        name: "create-idp-link",
        methods: &["post"],
        description: "Créer un lien d'identité pour un utilisateur",
        long_description: "Body: identityProvider, userId, userName",
        display_category: "IDP",
        display_order: 1,
        parameters: &[REALM, USER_ID, PROVIDER_ID],
    },
    EndpointInfo {
        name: "get-idp-link",
        methods: &["get"],
        description: "Récupérer la liste de liens d'identités pour un utilisateur",
        long_description: "Récupérer la liste de liens d'identités pour un utilisateur",
        display_category: "IDP",
        display_order: 1,
        parameters: &[REALM, USER_ID],
    },
    EndpointInfo {
        name: "delete-idp-link",
        methods: &["get"],
        description: "Supprime un lien d'identité pour un utilisateur",
        long_description: "Supprime un lien d'identité pour un utilisateur",
        display_category: "IDP",
        display_order: 2,
        parameters: &[REALM, USER_ID, PROVIDER_ID],
    },
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/keycloak/{slug}/", get(describe))
        .route("/keycloak/{slug}/get-bearer-token", get(get_bearer_token))
        .route("/keycloak/{slug}/read-users", get(read_users))
        .route("/keycloak/{slug}/read-user-groups", get(read_user_groups))
        .route("/keycloak/{slug}/read-user-credentials", get(read_user_credentials))
        .route("/keycloak/{slug}/delete-user-credential", get(delete_user_credential))
        .route("/keycloak/{slug}/update-user", post(update_user))
        .route("/keycloak/{slug}/create-user", post(create_user))
        .route("/keycloak/{slug}/get-user-by-mail", get(get_user_by_mail))
        .route("/keycloak/{slug}/read-user-by-mail", get(get_user_by_mail))
        .route("/keycloak/{slug}/read-groups", get(read_groups))
        .route("/keycloak/{slug}/delete-user", delete(delete_user))
        .route("/keycloak/{slug}/create-idp-link", post(create_idp_link))
        .route("/keycloak/{slug}/get-idp-link", get(get_idp_link))
        .route("/keycloak/{slug}/delete-idp-link", get(delete_idp_link))
        .route("/keycloak/{slug}/add-user-group", post(add_user_group))
        .route("/keycloak/{slug}/delete-user-group", get(delete_user_group))
}

#[derive(Debug, Deserialize)]
pub struct RealmParams {
    pub realm: String,
}

#[derive(Debug, Deserialize)]
pub struct UserParams {
    pub realm: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialParams {
    pub realm: String,
    pub user_id: String,
    pub credential_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserParams {
    pub realm: String,
    pub central_realm: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MailParams {
    pub realm: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct IdpParams {
    pub realm: String,
    pub user_id: String,
    pub provider_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupParams {
    pub realm: String,
    pub user_id: String,
    pub group_id: String,
}

type Q<T> = Result<Query<T>, QueryRejection>;

async fn describe(State(state): State<AppState>, Path(slug): Path<String>) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let config = connector.config();
    Ok(Envelope(json!({
        "kind": "keycloak",
        "slug": config.slug,
        "title": config.title.as_deref().unwrap_or(CONNECTOR),
        "endpoints": display_sorted(ENDPOINTS),
    })))
}

async fn get_bearer_token(State(state): State<AppState>, Path(slug): Path<String>) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let token = connector.access_token().await?;
    Ok(Envelope(json!({ "access_token": token })))
}

async fn read_users(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<RealmParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector.read_users(&p.realm).await.map(Envelope)
}

async fn read_user_groups(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<UserParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector.read_user_groups(&p.realm, &p.user_id).await.map(Envelope)
}

async fn read_user_credentials(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<UserParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector.read_user_credentials(&p.realm, &p.user_id).await.map(Envelope)
}

async fn delete_user_credential(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<CredentialParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector
        .delete_user_credential(&p.realm, &p.user_id, &p.credential_id)
        .await
        .map(Envelope)
}

async fn update_user(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<UserParams>,
    body: Bytes,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    let body = json_object(CONNECTOR, &body)?;
    connector.update_user(&p.realm, &p.user_id, body).await.map(Envelope)
}

async fn create_user(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<CreateUserParams>,
    body: Bytes,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    let body = json_object(CONNECTOR, &body)?;
    let central = p.central_realm.as_deref().filter(|realm| !realm.is_empty());
    connector.create_user(&p.realm, central, body).await.map(Envelope)
}

async fn get_user_by_mail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<MailParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector.get_user_by_mail(&p.realm, &p.email).await.map(Envelope)
}

async fn read_groups(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<RealmParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector.read_groups(&p.realm).await.map(Envelope)
}

async fn delete_user(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<UserParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector.delete_user(&p.realm, &p.user_id).await.map(Envelope)
}

async fn create_idp_link(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<IdpParams>,
    body: Bytes,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    let body = json_object(CONNECTOR, &body)?;
    connector
        .create_idp_link(&p.realm, &p.user_id, &p.provider_id, body)
        .await
        .map(Envelope)
}

async fn get_idp_link(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<UserParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector.get_idp_links(&p.realm, &p.user_id).await.map(Envelope)
}

async fn delete_idp_link(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<IdpParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector
        .delete_idp_link(&p.realm, &p.user_id, &p.provider_id)
        .await
        .map(Envelope)
}

async fn add_user_group(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<GroupParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector
        .add_user_group(&p.realm, &p.user_id, &p.group_id)
        .await
        .map(Envelope)
}

async fn delete_user_group(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Q<GroupParams>,
) -> ConnectorResult<Envelope> {
    let connector = state.registry.keycloak(&slug)?;
    let p = query_params(CONNECTOR, query)?;
    connector
        .delete_user_group(&p.realm, &p.user_id, &p.group_id)
        .await
        .map(Envelope)
}
