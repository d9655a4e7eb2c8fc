use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nex_core::ValidationError;
use nex_store::StoreError;
use thiserror::Error;

/// Every failure a handler can return. Rendered as `{success: false, error}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed JSON payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Detail is logged, never sent to the client.
    #[error("internal error")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Store(e.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedPayload(_) | ApiError::Store(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(detail) => tracing::error!(%detail, "request failed"),
            other => tracing::debug!(error = %other, "request rejected"),
        }
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
