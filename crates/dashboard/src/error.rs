use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use roas_report_core::errors::{CoreError, ErrorKind};
use serde_json::json;

/// JSON API error: `{"error": "...", "kind": "..."}` with a matching status.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.message, "kind": self.kind })),
        )
            .into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        let kind = e.kind();
        let status = match kind {
            ErrorKind::Validation | ErrorKind::MissingCredential => StatusCode::BAD_REQUEST,
            ErrorKind::PartialData
            | ErrorKind::Auth
            | ErrorKind::RateLimit
            | ErrorKind::Network
            | ErrorKind::Api
            | ErrorKind::Deserialization
            | ErrorKind::Truncated => StatusCode::BAD_GATEWAY,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            kind,
            message: e.to_string(),
        }
    }
}
