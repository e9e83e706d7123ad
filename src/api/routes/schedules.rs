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
use crate::api::models::ScheduleRequest;
use crate::api::AppState;
use crate::errors::VulnscanError;
use crate::scanner::models::CommandStatus;
use crate::scanner::ScheduleSpec;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get_schedules", get(get_schedules))
        .route("/create_schedule", post(create_schedule))
        .route("/modify_schedule", post(modify_schedule))
        .route("/delete_schedule/:id", delete(delete_schedule))
}

pub async fn get_schedules(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Value>, VulnscanError> {
    let schedules = state.scanner.session().await?.get_schedules().await?;
    Ok(Json(json!({"schedules": schedules})))
}

pub async fn create_schedule(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<ScheduleRequest>,
) -> Result<(StatusCode, Json<Value>), VulnscanError> {
    let name = required(&req.name, "name")?;
    required(&req.dtstart, "dtstart")?;
    let spec = ScheduleSpec {
        name: Some(name),
        recurrence: req.recurrence()?,
        timezone: Some(req.timezone.as_deref().unwrap_or("UTC")),
        comment: req.comment.as_deref(),
    };
    let id = state.scanner.session().await?.create_schedule(&spec).await?;
    info!(schedule_id = %id, "Schedule created");
    Ok((StatusCode::CREATED, Json(json!({"schedule_id": id}))))
}

/// Re-renders the calendar only when a new `dtstart` is supplied.
pub async fn modify_schedule(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<ScheduleRequest>,
) -> Result<Json<Value>, VulnscanError> {
    let id = required(&req.schedule_id, "schedule_id")?;
    let spec = ScheduleSpec {
        name: req.name.as_deref(),
        recurrence: req.recurrence()?,
        timezone: req.timezone.as_deref(),
        comment: req.comment.as_deref(),
    };
    state.scanner.session().await?.modify_schedule(id, &spec).await?;
    Ok(Json(json!({"message": "Schedule modified successfully"})))
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.delete_schedule(&id).await?))
}
