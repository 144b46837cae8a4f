use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Could not reach Gotenberg: {0}")]
    Gotenberg(#[from] reqwest::Error),

    #[error("Gotenberg error: {status} {reason}")]
    Conversion { status: u16, reason: String },
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        log::error!("PDF generation error: {self}");
        let body = Json(json!({ "error": "Failed to generate PDF" }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
