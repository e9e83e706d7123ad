use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{error, warn};
use crate::errors::VulnscanError;

impl IntoResponse for VulnscanError {
    fn into_response(self) -> axum::response::Response {
        let class = self.classify();
        let status = StatusCode::from_u16(class.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), error_type = class.error_type, error = %message, "Request failed");
        } else {
            warn!(status = status.as_u16(), error_type = class.error_type, error = %message, "Request rejected");
        }

        (status, Json(json!({"error": message, "type": class.error_type}))).into_response()
    }
}

/// `Json` whose rejections use the same error body as every other failure.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = VulnscanError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(VulnscanError::Validation(rejection.body_text())),
        }
    }
}

/// Returns the trimmed value of a required string field.
pub fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, VulnscanError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| VulnscanError::Validation(format!("{} is required", field)))
}
