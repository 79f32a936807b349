use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlyerError {
    /// The page image could not be decoded. Fatal for that page only.
    #[error("Failed to read image: {0}")]
    Image(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<image::ImageError> for FlyerError {
    fn from(e: image::ImageError) -> Self {
        FlyerError::Image(e.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for FlyerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            FlyerError::Image(_) => (StatusCode::UNPROCESSABLE_ENTITY, "IMAGE_ERROR"),
            FlyerError::Pdf(_) => (StatusCode::UNPROCESSABLE_ENTITY, "PDF_ERROR"),
            FlyerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            FlyerError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE"),
            FlyerError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            FlyerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            FlyerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            FlyerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
