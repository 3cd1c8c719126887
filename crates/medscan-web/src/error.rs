//! HTTP错误响应

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use medscan_core::ScanError;
use serde_json::json;

/// 包装 `ScanError`，统一转换为 `{ error, message, status }` 响应体
#[derive(Debug)]
pub struct ApiError(pub ScanError);

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ScanError::Offline => StatusCode::SERVICE_UNAVAILABLE,
            ScanError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ScanError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ScanError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ScanError::Validation(_) | ScanError::Read(_) => StatusCode::BAD_REQUEST,
            ScanError::NotFound(_) => StatusCode::NOT_FOUND,
            ScanError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            ScanError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ScanError::Transport(_)
            | ScanError::NoResponse
            | ScanError::Parse(_)
            | ScanError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": true,
            "message": self.0.user_message(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
