use axum::{extract::State, routing::post, Json, Router};
use tracing::info;
use crate::ai::{CveAnalyzer, CveAnswer};
use crate::api::auth::CurrentUser;
use crate::api::errors::ApiJson;
use crate::api::models::AnalyzeRequest;
use crate::api::AppState;
use crate::errors::VulnscanError;

pub fn routes() -> Router<AppState> {
    Router::new().route("/analyze_cve", post(analyze_cve))
}

pub async fn analyze_cve(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<AnalyzeRequest>,
) -> Result<Json<Vec<CveAnswer>>, VulnscanError> {
    let llm = state
        .llm
        .clone()
        .ok_or_else(|| VulnscanError::Unavailable("AI analysis is not configured".into()))?;
    info!(user = %user.user.username, findings = req.results.len(), "CVE analysis requested");
    let answers = CveAnalyzer::new(llm).analyze(&req.results).await;
    Ok(Json(answers))
}
