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
use crate::api::models::{BatchTasksRequest, ResultsRequest, TaskRequest};
use crate::api::AppState;
use crate::errors::VulnscanError;
use crate::scanner::models::{CommandStatus, TaskAction, TaskDetail, TaskStatus};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create_task", post(create_task))
        .route("/modify_task/:id", put(modify_task))
        .route("/start_task/:id", post(start_task))
        .route("/stop_task/:id", post(stop_task))
        .route("/resume_task/:id", post(resume_task))
        .route("/delete_task/:id", delete(delete_task))
        .route("/batch_tasks", post(batch_tasks))
        .route("/get_tasks", get(get_tasks))
        .route("/get_task/:id", get(get_task))
        .route("/get_task_status/:id", get(get_task_status))
        .route("/get_results", post(get_results))
}

pub async fn create_task(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<TaskRequest>,
) -> Result<(StatusCode, Json<Value>), VulnscanError> {
    for (value, field) in [
        (&req.name, "name"),
        (&req.target_id, "target_id"),
        (&req.config_id, "config_id"),
        (&req.scanner_id, "scanner_id"),
    ] {
        required(value, field)?;
    }
    let id = state.scanner.session().await?.create_task(&req.spec()).await?;
    info!(task_id = %id, "Scanner task created");
    Ok((StatusCode::CREATED, Json(json!({"task_id": id}))))
}

pub async fn modify_task(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<TaskRequest>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.modify_task(&id, &req.spec()).await?))
}

async fn forward(state: &AppState, action: TaskAction, id: &str) -> Result<Json<CommandStatus>, VulnscanError> {
    let status = state.scanner.session().await?.task_action(action, id).await?;
    info!(task_id = %id, action = ?action, status = %status.status, "Task action forwarded");
    Ok(Json(status))
}

pub async fn start_task(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    forward(&state, TaskAction::Start, &id).await
}

pub async fn stop_task(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    forward(&state, TaskAction::Stop, &id).await
}

pub async fn resume_task(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    forward(&state, TaskAction::Resume, &id).await
}

pub async fn delete_task(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    forward(&state, TaskAction::Delete, &id).await
}

pub async fn batch_tasks(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<BatchTasksRequest>,
) -> Result<Json<Value>, VulnscanError> {
    if req.task_ids.is_empty() {
        return Err(VulnscanError::Validation("task_ids must not be empty".into()));
    }
    let results = state
        .scanner
        .session()
        .await?
        .batch_tasks(req.action, &req.task_ids)
        .await?;
    Ok(Json(json!({"results": results})))
}

pub async fn get_tasks(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Value>, VulnscanError> {
    let tasks = state.scanner.session().await?.get_tasks().await?;
    Ok(Json(json!({"tasks": tasks})))
}

pub async fn get_task(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<TaskDetail>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_task(&id).await?))
}

pub async fn get_task_status(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<TaskStatus>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_task_status(&id).await?))
}

pub async fn get_results(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiJson(req): ApiJson<ResultsRequest>,
) -> Result<Json<Value>, VulnscanError> {
    let task_id = required(&req.task_id, "task_id")?;
    let results = state.scanner.session().await?.get_results(task_id).await?;
    Ok(Json(json!({"results": results})))
}
