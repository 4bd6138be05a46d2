use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::response::ApiResponse;

/// Standard error type for the Etude starter.
#[derive(Debug, Error)]
pub enum EtudeError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unique-email violation at the user store.
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),

    /// Invalid, expired or already-used verification / reset token.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl EtudeError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            EtudeError::NotFound(_) => StatusCode::NOT_FOUND,
            EtudeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            EtudeError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            EtudeError::Forbidden(_) => StatusCode::FORBIDDEN,
            EtudeError::DuplicateEmail(_) => StatusCode::CONFLICT,
            EtudeError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            EtudeError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EtudeError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            EtudeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EtudeError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            EtudeError::NotFound(_) => "NOT_FOUND",
            EtudeError::BadRequest(_) => "BAD_REQUEST",
            EtudeError::Unauthorized(_) => "UNAUTHORIZED",
            EtudeError::Forbidden(_) => "FORBIDDEN",
            EtudeError::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            EtudeError::InvalidToken(_) => "INVALID_TOKEN",
            EtudeError::Validation(_) => "VALIDATION_ERROR",
            EtudeError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            EtudeError::Internal(_) => "INTERNAL_ERROR",
            EtudeError::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Error detail for API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl axum::response::IntoResponse for EtudeError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        // Storage failures are logged with detail; the client gets a
        // generic message.
        let message = match &self {
            EtudeError::Database(err) => {
                tracing::error!("Database error: {err}");
                "A storage error occurred".to_string()
            }
            EtudeError::Internal(detail) => {
                tracing::error!("Internal error: {detail}");
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body: ApiResponse<()> = ApiResponse {
            success: false,
            data: None,
            error: Some(ErrorDetail {
                code: self.error_code().to_string(),
                message,
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
