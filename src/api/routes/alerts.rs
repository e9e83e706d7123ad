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
use crate::api::models::AlertRequest;
use crate::api::AppState;
use crate::errors::VulnscanError;
use crate::scanner::models::{Alert, CommandStatus};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create_alert", post(create_alert))
        .route("/get_alerts", get(get_alerts))
        .route("/modify_alert", post(modify_alert))
        .route("/delete_alert/:id", delete(delete_alert))
}

pub async fn create_alert(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<AlertRequest>,
) -> Result<(StatusCode, Json<Value>), VulnscanError> {
    for (value, field) in [
        (&req.name, "name"),
        (&req.condition, "condition"),
        (&req.event, "event"),
        (&req.method, "method"),
    ] {
        required(value, field)?;
    }
    let id = state.scanner.session().await?.create_alert(&req.spec()).await?;
    info!(alert_id = %id, "Alert created");
    Ok((StatusCode::CREATED, Json(json!({"alert_id": id}))))
}

pub async fn get_alerts(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<Alert>>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_alerts().await?))
}

pub async fn modify_alert(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<AlertRequest>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    let id = required(&req.alert_id, "alert_id")?;
    Ok(Json(state.scanner.session().await?.modify_alert(id, &req.spec()).await?))
}

pub async fn delete_alert(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.delete_alert(&id).await?))
}
