use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PixelError {
    /// Missing or unusable callback name, or missing referrer
    #[error("bad request")]
    BadRequest,

    /// The referrer header is present but is not an absolute URL with a host
    #[error("malformed referrer: {0}")]
    MalformedReferrer(String),

    #[error("internal server error")]
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl PixelError {
    pub fn status(&self) -> StatusCode {
        match self {
            // Kept as 404 for compatibility with deployed embed scripts
            PixelError::BadRequest => StatusCode::NOT_FOUND,
            PixelError::MalformedReferrer(_) | PixelError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text shown to the caller; parse details stay in the logs
    fn public_message(&self) -> &'static str {
        match self {
            PixelError::BadRequest => "bad request",
            PixelError::MalformedReferrer(_) | PixelError::Internal => "internal server error",
        }
    }
}

impl IntoResponse for PixelError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            code: status.as_u16(),
            message: self.public_message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}
