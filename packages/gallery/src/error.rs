use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by non-form endpoints on failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `INVALID_ID`,
    /// `INVALID_CREDENTIALS`, `NOT_FOUND`, `FILE_MISSING`,
    /// `QUOTA_EXCEEDED`, `UPLOAD_LIMIT`, `UPLOAD_FAILED`, `EXPORT_FAILED`,
    /// `INTERNAL_ERROR`.
    pub code: &'static str,
    /// Human-readable error description.
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Path id was not a well-formed numeric identifier.
    InvalidId(String),
    InvalidCredentials,
    /// The metadata record does not exist.
    NotFound(String),
    /// The record exists but its file is gone from disk.
    FileMissing(String),
    QuotaExceeded(String),
    /// Oversized file or too many files in one request.
    UploadLimit(String),
    /// Metadata could not be persisted; the batch was rolled back.
    UploadFailed(String),
    ExportFailed(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::InvalidId(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_ID",
                    message: msg,
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::FileMissing(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "FILE_MISSING",
                    message: msg,
                },
            ),
            AppError::QuotaExceeded(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "QUOTA_EXCEEDED",
                    message: msg,
                },
            ),
            AppError::UploadLimit(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "UPLOAD_LIMIT",
                    message: msg,
                },
            ),
            AppError::UploadFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "UPLOAD_FAILED",
                    message: msg,
                },
            ),
            AppError::ExportFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "EXPORT_FAILED",
                    message: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }

    /// Text shown to the user in a flash redirect. Internal details are
    /// logged, never shown.
    pub fn into_message(self) -> String {
        self.status_and_body().1.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Internal(err.to_string())
    }
}
