use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;
use crate::api::auth::{AdminUser, CurrentUser};
use crate::api::errors::{required, ApiJson};
use crate::api::models::{AddTargetRequest, GroupNameRequest, RemoveFromGroupRequest};
use crate::api::AppState;
use crate::db::{GroupSummary, LocalTarget};
use crate::errors::VulnscanError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create_group", post(create_group))
        .route("/get_groups", get(get_groups))
        .route("/rename_group/:id", put(rename_group))
        .route("/delete_group/:id", delete(delete_group))
        .route("/add_target", post(add_target))
        .route("/remove_from_group", post(remove_from_group))
        .route("/get_group_targets/:id", get(get_group_targets))
        .route("/delete_target/:id", delete(delete_target))
}

pub async fn create_group(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<GroupNameRequest>,
) -> Result<(StatusCode, Json<Value>), VulnscanError> {
    let name = required(&req.group_name, "group_name")?;
    let id = state.db.create_group(name)?;
    info!(group_id = id, name = %name, "Group created");
    Ok((StatusCode::CREATED, Json(json!({"message": "Group created", "group_id": id}))))
}

pub async fn get_groups(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<GroupSummary>>, VulnscanError> {
    Ok(Json(state.db.list_groups()?))
}

pub async fn rename_group(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<GroupNameRequest>,
) -> Result<Json<Value>, VulnscanError> {
    let name = required(&req.group_name, "group_name")?;
    state.db.rename_group(id, name)?;
    Ok(Json(json!({"message": "Group renamed", "new_name": name})))
}

pub async fn delete_group(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, VulnscanError> {
    state.db.delete_group(id)?;
    info!(group_id = id, "Group deleted");
    Ok(Json(json!({"message": "Group deleted"})))
}

pub async fn add_target(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<AddTargetRequest>,
) -> Result<(StatusCode, Json<Value>), VulnscanError> {
    let name = required(&req.name, "name")?;
    let ip_address = required(&req.ip_address, "ip_address")?;
    let group_id = req
        .group_id
        .ok_or_else(|| VulnscanError::Validation("group_id is required".into()))?;

    let id = state.db.add_target(name, ip_address, group_id)?;
    Ok((StatusCode::CREATED, Json(json!({"message": "Target added", "target_id": id}))))
}

pub async fn remove_from_group(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<RemoveFromGroupRequest>,
) -> Result<Json<Value>, VulnscanError> {
    let (Some(target_id), Some(group_id)) = (req.target_id, req.group_id) else {
        return Err(VulnscanError::Validation("target_id and group_id are required".into()));
    };
    state.db.remove_from_group(target_id, group_id)?;
    Ok(Json(json!({"message": "Target removed from group"})))
}

pub async fn get_group_targets(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<LocalTarget>>, VulnscanError> {
    Ok(Json(state.db.get_group_targets(id)?))
}

pub async fn delete_target(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, VulnscanError> {
    state.db.delete_target(id)?;
    Ok(Json(json!({"message": "Target deleted"})))
}
