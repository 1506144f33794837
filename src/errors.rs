use crate::{
    auth::RegistrationError,
    services::{
        blobs::BlobError, erasure::ErasureError, meetings::MeetingError, records::StoreError,
        upload::UploadError,
    },
    validation::ValidationError,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 401 Unauthorized
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    /// Shortcut for 422 Unprocessable Entity (rejected user input)
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{} {}", self.status, self.message);
        }

        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MeetingNotFound(_) => AppError::not_found(err.to_string()),
            StoreError::Sqlx(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::ObjectNotFound(_) | BlobError::PrefixNotFound(_) => {
                AppError::not_found(err.to_string())
            }
            BlobError::InvalidPath(_) => AppError::new(StatusCode::BAD_REQUEST, err.to_string()),
            BlobError::Io(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<MeetingError> for AppError {
    fn from(err: MeetingError) -> Self {
        match err {
            MeetingError::NotFound(_) | MeetingError::AnalysisNotFound(_) => {
                AppError::not_found(err.to_string())
            }
            MeetingError::Store(inner) => inner.into(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::invalid(err.to_string())
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        AppError::invalid(err.to_string())
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Invalid(inner) => inner.into(),
            UploadError::InvalidOwner(_) => AppError::new(StatusCode::BAD_REQUEST, err.to_string()),
            UploadError::Transfer(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<ErasureError> for AppError {
    fn from(err: ErasureError) -> Self {
        match err {
            ErasureError::InvalidUserId(_) => AppError::new(StatusCode::BAD_REQUEST, err.to_string()),
            _ => AppError::internal(err.to_string()),
        }
    }
}
