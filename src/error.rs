//! Application error type and its HTTP mapping.
//!
//! Every error renders as a JSON body with a `message`. Internal errors never
//! expose their cause: it is logged and the client sees
//! `{"message": "Internal Server Error"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::validation::ValidationError;

/// Message returned for every unexpected failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Value::is_null")]
    details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// Transient failure; the same request may succeed on retry.
    #[error("{message}")]
    Unavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Returns true if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Conflict { .. })
    }

    /// HTTP status this error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::Validation { message, details } => ErrorBody {
                message,
                code: "validation_error",
                details,
            },
            AppError::NotFound { message, details } => ErrorBody {
                message,
                code: "not_found",
                details,
            },
            AppError::Conflict { message, details } => ErrorBody {
                message,
                code: "conflict",
                details,
            },
            AppError::Unavailable { message, details } => {
                tracing::warn!(%message, %details, "Transient failure");
                ErrorBody {
                    message,
                    code: "unavailable",
                    details: Value::Null,
                }
            }
            AppError::Internal { message, details } => {
                tracing::error!(%message, %details, "Request failed");
                ErrorBody {
                    message: INTERNAL_ERROR_MESSAGE.to_string(),
                    code: "internal_error",
                    details: Value::Null,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        let details = match &e {
            ValidationError::InvalidUrl { index, url } => json!({ "index": index, "url": url }),
            ValidationError::DuplicatePlatform { platform } => json!({ "platform": platform }),
            ValidationError::UnsupportedPlatform { index, platform } => {
                json!({ "index": index, "platform": platform })
            }
            ValidationError::MissingField { index } => json!({ "index": index }),
            ValidationError::MissingOwner => Value::Null,
        };

        AppError::bad_request(e.to_string(), details)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = e.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        AppError::bad_request(
            format!("Invalid request: {}", fields.join(", ")),
            json!({ "fields": fields }),
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return AppError::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": db.constraint() }),
                );
            }

            // 40001 serialization_failure, 40P01 deadlock_detected
            if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
                return AppError::unavailable(
                    "Concurrent update, retry",
                    json!({ "reason": db.message() }),
                );
            }
        }

        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::unavailable("Database unavailable", json!({ "reason": e.to_string() }))
            }
            other => AppError::internal("Database error", json!({ "reason": other.to_string() })),
        }
    }
}
