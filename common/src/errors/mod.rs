//! Error types shared by all catalog services.
//!
//! `AppError` is what handlers return; it renders itself as an `ApiResponse`
//! error envelope with the matching HTTP status.

pub mod validation;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

pub use validation::{
    ConstraintRule, FieldShape, ReferenceDefect, ValidationError, ValidationErrors,
};

/// Result alias used across services.
pub type AppResult<T> = Result<T, AppError>;

/// Service-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// Entity failed schema validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Request is malformed outside of entity validation (bad path or query).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No database with the given id or name.
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    /// An entity with the same fully qualified name already exists.
    #[error("entity already exists: {0}")]
    EntityExists(String),

    /// Could not open the catalog store.
    #[error("storage connection error: {0}")]
    StorageConnection(String),

    /// Catalog store operation failed.
    #[error("storage query error: {0}")]
    StorageQuery(String),

    /// Encoding or decoding a stored record failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EntityExists(_) => StatusCode::CONFLICT,
            AppError::StorageConnection(_)
            | AppError::StorageQuery(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::DatabaseNotFound(_) => "NOT_FOUND",
            AppError::EntityExists(_) => "CONFLICT",
            AppError::StorageConnection(_) | AppError::StorageQuery(_) => "STORAGE_ERROR",
            AppError::Serialization(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::Validation(ValidationErrors::single(error))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }

        let body = match &self {
            AppError::Validation(errors) => match serde_json::to_value(errors) {
                Ok(details) => ApiResponse::err_with_details(self.code(), self.to_string(), details),
                Err(_) => ApiResponse::err(self.code(), self.to_string()),
            },
            _ => ApiResponse::err(self.code(), self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
