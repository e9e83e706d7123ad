use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use crate::api::auth::{AdminUser, CurrentUser};
use crate::api::errors::{required, ApiJson};
use crate::api::models::{CloneUserRequest, CreateScannerUserRequest, ModifyScannerUserRequest};
use crate::api::AppState;
use crate::errors::VulnscanError;
use crate::scanner::models::{CommandStatus, Role, ScannerUser};
use crate::scanner::UserSpec;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/authenticate", post(authenticate))
        .route("/get_roles", get(get_roles))
        .route("/get_users", get(get_users))
        .route("/get_user/:id", get(get_user))
        .route("/create_user", post(create_user))
        .route("/modify_user/:id", put(modify_user))
        .route("/delete_user/:id", delete(delete_user))
        .route("/clone_user/:id", post(clone_user))
}

/// Checks that the service account can log in to the scanner.
pub async fn authenticate(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Value>, VulnscanError> {
    state.scanner.session().await?;
    Ok(Json(json!({"message": "Authenticated successfully"})))
}

pub async fn get_roles(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<Role>>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_roles().await?))
}

pub async fn get_users(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<ScannerUser>>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_users().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ScannerUser>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_user(&id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<CreateScannerUserRequest>,
) -> Result<(StatusCode, Json<Value>), VulnscanError> {
    let spec = UserSpec {
        name: required(&req.name, "name")?,
        password: Some(required(&req.password, "password")?),
        comment: req.comment.as_deref(),
        role_ids: &req.role_ids,
    };
    let id = state.scanner.session().await?.create_user(&spec).await?;
    Ok((StatusCode::CREATED, Json(json!({"user_id": id}))))
}

pub async fn modify_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ModifyScannerUserRequest>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    let status = state
        .scanner
        .session()
        .await?
        .modify_user(&id, req.name.as_deref(), req.password.as_deref(), req.role_ids.as_deref())
        .await?;
    Ok(Json(status))
}

pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.delete_user(&id).await?))
}

pub async fn clone_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    body: Option<ApiJson<CloneUserRequest>>,
) -> Result<(StatusCode, Json<Value>), VulnscanError> {
    let req = body.map(|ApiJson(r)| r).unwrap_or_default();
    let (new_id, name) = state
        .scanner
        .session()
        .await?
        .clone_user(&id, req.name.as_deref(), req.comment.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({"user_id": new_id, "name": name}))))
}
