//! Request-boundary error type
//!
//! Every failure a handler can hit is converted into an [`ApiError`], which
//! renders as an HTTP status plus a JSON [`ErrorResponse`] body.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fieldops_auth::{JwtError, PasswordError};
use fieldops_core::CoreError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed or expired token
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Duplicate unique value, illegal status change, or a delete blocked by references
    #[error("{0}")]
    Conflict(String),

    /// Store or token issuer failure; the detail goes into the `error` field
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Internal(detail) => ErrorResponse {
                message: "Internal server error".to_string(),
                error: Some(detail.clone()),
            },
            other => ErrorResponse {
                message: other.to_string(),
                error: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        }

        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                warn!("Unique constraint violated: {}", detail);
                ApiError::Conflict("A record with the same unique value already exists".to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                warn!("Foreign key constraint violated: {}", detail);
                ApiError::Conflict("The record is still referenced by other records".to_string())
            }
            _ => match err {
                DbErr::RecordNotFound(what) => ApiError::NotFound(what),
                other => ApiError::Internal(format!("Database error: {}", other)),
            },
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Forbidden(message) => ApiError::Forbidden(message),
            CoreError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            CoreError::Validation(message) => ApiError::Validation(message),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::Unauthenticated(format!("Invalid or expired token: {}", err))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
