//! Mapping of application errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ledgerview_core::cache::LoadError;
use ledgerview_core::ledger::StoreError;
use ledgerview_core::views::LookupError;
use ledgerview_shared::AppError;
use ledgerview_shared::types::IdParseError;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by handlers, rendered as `{"error", "message"}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        let message = err.to_string();
        let app = match err.load_error() {
            LoadError::Timeout(_) => AppError::Timeout(message),
            LoadError::Store(
                StoreError::Unavailable(_) | StoreError::Query(_) | StoreError::HeadMoving(_),
            ) => AppError::Database(message),
            LoadError::Store(StoreError::InvalidData(_)) => AppError::Internal(message),
        };
        Self(app)
    }
}

impl From<IdParseError> for ApiError {
    fn from(err: IdParseError) -> Self {
        Self(AppError::Validation(format!("Invalid account id: {err}")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, code = self.0.error_code(), "request failed");
        } else {
            warn!(error = %self.0, code = self.0.error_code(), "request rejected");
        }

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}
