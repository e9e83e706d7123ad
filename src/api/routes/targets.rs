use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;
use crate::api::auth::{AdminUser, CurrentUser};
use crate::api::errors::{required, ApiJson};
use crate::api::models::{ConvertHostsRequest, CreateTargetRequest, ModifyTargetRequest};
use crate::api::AppState;
use crate::errors::VulnscanError;
use crate::scanner::models::{CommandStatus, ConversionOutcome, Target};
use crate::scanner::{NewTarget, TargetChanges};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get_targets", get(get_targets))
        .route("/create_target", post(create_target))
        .route("/modify_target/:id", post(modify_target))
        .route("/delete_target/:id", delete(delete_target))
        .route("/convert_hosts_to_targets", post(convert_hosts_to_targets))
}

pub async fn get_targets(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<Target>>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_targets().await?))
}

pub async fn create_target(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<CreateTargetRequest>,
) -> Result<(StatusCode, Json<Value>), VulnscanError> {
    let name = required(&req.name, "name")?;
    let hosts = req.hosts.clone().map(|h| h.into_vec()).unwrap_or_default();
    if hosts.is_empty() {
        return Err(VulnscanError::Validation("Name and hosts are required.".into()));
    }

    let target = NewTarget {
        name,
        hosts: &hosts,
        port_range: req.port_range.as_deref(),
        port_list_id: req.port_list_id.as_deref(),
        comment: req.comment.as_deref(),
    };
    let id = state.scanner.session().await?.create_target(&target).await?;
    info!(target_id = %id, name = %name, hosts = hosts.len(), "Scanner target created");
    Ok((StatusCode::CREATED, Json(json!({"target_id": id}))))
}

pub async fn modify_target(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ModifyTargetRequest>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    let hosts = req.hosts.map(|h| h.into_vec());
    let exclude_hosts = req.exclude_hosts.map(|h| h.into_vec());
    let changes = TargetChanges {
        name: req.name.as_deref(),
        hosts: hosts.as_deref(),
        exclude_hosts: exclude_hosts.as_deref(),
        port_list_id: req.port_list_id.as_deref(),
        comment: req.comment.as_deref(),
    };
    Ok(Json(state.scanner.session().await?.modify_target(&id, &changes).await?))
}

pub async fn delete_target(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.delete_target(&id).await?))
}

pub async fn convert_hosts_to_targets(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<ConvertHostsRequest>,
) -> Result<(StatusCode, Json<ConversionOutcome>), VulnscanError> {
    let outcome = state
        .scanner
        .session()
        .await?
        .convert_hosts_to_targets(&req.hosts, req.port_list_id.as_deref(), req.port_range.as_deref())
        .await?;
    info!(
        created = outcome.created_targets.len(),
        skipped = outcome.skipped.len(),
        failed = outcome.failed.len(),
        "Converted hosts to targets"
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}
