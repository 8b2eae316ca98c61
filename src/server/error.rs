use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// API错误类型，状态码由库错误的类别决定
pub struct AppError(pub StatusCode, pub anyhow::Error);

impl AppError {
    pub fn unauthorized() -> Self {
        Self(StatusCode::UNAUTHORIZED, anyhow::anyhow!("无效的 token"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1.to_string() }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        let status = match err.downcast_ref::<Error>() {
            Some(Error::Input(_)) | Some(Error::DimensionMismatch { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Some(Error::CollectionNotFound(_)) => StatusCode::NOT_FOUND,
            Some(Error::DuplicateName(_)) | Some(Error::DuplicatePath(_)) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self(status, err)
    }
}
