/// Error types for tweet-service
///
/// Every failure carries an explicit [`ErrorKind`] so callers can branch on the
/// kind instead of parsing messages. Errors render as the standard failure
/// envelope (see [`crate::response::ApiResponse`]).
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::ApiResponse;

/// SQLSTATE for unique_violation
const PG_UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for foreign_key_violation
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Error classification exposed at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    InvalidInput,
    NotFound,
    Conflict,
    Upstream,
    Internal,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation (duplicate username, racing duplicate join row)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Unauthenticated => ErrorKind::Unauthenticated,
            ServiceError::InvalidInput(_) => ErrorKind::InvalidInput,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Upstream(_) => ErrorKind::Upstream,
            ServiceError::Database(_) | ServiceError::Cache(_) | ServiceError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Message safe to show to end users. Internal causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            ErrorKind::Upstream => "Upstream service unavailable".to_string(),
            _ => self.to_string(),
        }
    }

    /// Classify a sqlx error, naming the entity a foreign key points at.
    pub fn from_sqlx(err: sqlx::Error, referenced: &str) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ServiceError::NotFound(referenced.to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => ServiceError::Conflict(
                    db_err
                        .constraint()
                        .map(|c| format!("unique constraint {} violated", c))
                        .unwrap_or_else(|| "duplicate record".to_string()),
                ),
                Some(PG_FOREIGN_KEY_VIOLATION) => ServiceError::NotFound(referenced.to_string()),
                _ => ServiceError::Database(err),
            },
            _ => ServiceError::Database(err),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::from_sqlx(err, "record")
    }
}

impl From<redis::RedisError> for ServiceError {
    fn from(err: redis::RedisError) -> Self {
        ServiceError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.kind() == ErrorKind::Internal || self.kind() == ErrorKind::Upstream {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(self.status_code())
            .json(ApiResponse::<()>::failure(self.kind(), self.public_message()))
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
