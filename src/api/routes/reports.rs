use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;
use crate::api::auth::{AdminUser, CurrentUser};
use crate::api::AppState;
use crate::errors::VulnscanError;
use crate::reporting::{export_report as render, ExportFormat};
use crate::scanner::models::{CommandStatus, Report, ReportWithTask};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get_reports", get(get_reports))
        .route("/get_report/:id", get(get_report))
        .route("/get_reports_with_tasks", get(get_reports_with_tasks))
        .route("/delete_report/:id", delete(delete_report))
        .route("/export_report/:id/:format", get(export_report))
}

pub async fn get_reports(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Value>, VulnscanError> {
    let reports = state.scanner.session().await?.get_reports().await?;
    Ok(Json(json!({"reports": reports})))
}

pub async fn get_report(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Report>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_report(&id).await?))
}

pub async fn get_reports_with_tasks(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<ReportWithTask>>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.get_reports_with_tasks().await?))
}

pub async fn delete_report(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CommandStatus>, VulnscanError> {
    Ok(Json(state.scanner.session().await?.delete_report(&id).await?))
}

pub async fn export_report(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((id, format)): Path<(String, String)>,
) -> Result<Response, VulnscanError> {
    let format: ExportFormat = format.parse()?;
    let report = state.scanner.session().await?.get_report(&id).await?;

    let results = report.results.len();
    let bytes = tokio::task::spawn_blocking(move || render(&report, format))
        .await
        .map_err(|e| VulnscanError::Internal(format!("Export task failed: {}", e)))??;
    info!(report_id = %id, %format, results, bytes = bytes.len(), "Report exported");

    let disposition = format!("attachment; filename=\"{}\"", format.filename(&id));
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
