#[cfg(feature = "web")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message returned to clients when either upload cannot be decoded.
pub const DECODE_FAILURE_MESSAGE: &str = "画像ファイルを開けませんでした";

/// Main error type for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An uploaded file could not be turned into pixels.
    ///
    /// The inner string is logged; clients only ever see
    /// [`DECODE_FAILURE_MESSAGE`].
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model loading or inference errors
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required multipart field was not sent
    #[error("Field required: {0}")]
    MissingField(String),

    /// Request body exceeded the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Malformed multipart bodies
    #[error("Upload error: {0}")]
    Upload(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error body sent to clients: `{"detail": "..."}`
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    /// Human readable error description
    pub detail: String,
}

impl AppError {
    #[cfg(feature = "web")]
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ImageDecode(_) => StatusCode::BAD_REQUEST,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert the error to the JSON body returned to clients
    pub fn to_json(&self) -> ErrorResponse {
        let detail = match self {
            Self::ImageDecode(_) => DECODE_FAILURE_MESSAGE.to_string(),
            _ => self.to_string(),
        };
        ErrorResponse { detail }
    }
}

#[cfg(feature = "web")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }

        (status, Json(self.to_json())).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Task join error: {}", err))
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::ImageDecode(err.to_string())
    }
}

#[cfg(feature = "web")]
impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::Upload(err.body_text())
        }
    }
}

#[cfg(feature = "web")]
impl From<axum::extract::multipart::MultipartRejection> for AppError {
    fn from(rejection: axum::extract::multipart::MultipartRejection) -> Self {
        AppError::Upload(rejection.body_text())
    }
}

#[cfg(feature = "embeddings")]
impl From<tch::TchError> for AppError {
    fn from(err: tch::TchError) -> Self {
        AppError::Model(format!("PyTorch error: {}", err))
    }
}

#[cfg(feature = "heic")]
impl From<libheif_rs::HeifError> for AppError {
    fn from(err: libheif_rs::HeifError) -> Self {
        AppError::ImageDecode(format!("HEIF: {}", err))
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;
