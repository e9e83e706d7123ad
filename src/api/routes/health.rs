use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "vulnscan",
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH"),
        "built_at": env!("BUILD_TIMESTAMP"),
    }))
}
