use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use crate::api::auth::{AdminUser, CurrentUser};
use crate::api::AppState;
use crate::errors::VulnscanError;
use crate::scanner::models::{CommandStatus, ScanConfig, ScannerInfo};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get_scanners", get(get_scanners))
        .route("/get_configs", get(get_configs))
        .route("/get_portlists", get(get_portlists))
        .route("/get_hosts", get(get_hosts))
        .route("/delete_host/:id", delete(delete_host))
}

pub async fn get_scanners(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<ScannerInfo>>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_scanners().await?))
}

pub async fn get_configs(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<ScanConfig>>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_configs().await?))
}

pub async fn get_portlists(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Value>, VulnscanError> {
    let portlists = state.scanner.session().await?.get_port_lists().await?;
    Ok(Json(json!({"portlists": portlists})))
}

pub async fn get_hosts(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Value>, VulnscanError> {
    let hosts = state.scanner.session().await?.get_hosts().await?;
    Ok(Json(json!({"hosts": hosts})))
}

pub async fn delete_host(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.delete_host(&id).await?))
}
