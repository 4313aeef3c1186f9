use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::services::{AuthError, ServiceError};

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized {
        message: String,
        code: Option<&'static str>,
    },

    Forbidden(String),

    NotFound(String),

    ValidationError(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized { message, .. } => write!(f, "Unauthorized: {message}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            Self::Unauthorized { message, code } => (StatusCode::UNAUTHORIZED, message, code),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, None),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    None,
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        (status, Json(ErrorBody { message, code })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(format!("{err:#}"))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Forbidden(msg) => Self::Forbidden(msg),
            ServiceError::Unauthenticated(message) => Self::Unauthorized {
                message,
                code: None,
            },
            ServiceError::Validation(msg) | ServiceError::Invariant(msg) => {
                Self::ValidationError(msg)
            }
            ServiceError::NotFound(msg) => Self::NotFound(msg),
            ServiceError::Database(msg) => Self::DatabaseError(msg),
            ServiceError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
            other => Self::Unauthorized {
                code: other.code(),
                message: other.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();

        // "missing field `email` at line 1 column 2" -> "Missing required field: email"
        let message = text
            .find("missing field `")
            .and_then(|start| {
                let rest = &text[start + "missing field `".len()..];
                rest.find('`').map(|end| format!("Missing required field: {}", &rest[..end]))
            })
            .unwrap_or(text);

        Self::ValidationError(message)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::ValidationError(rejection.body_text())
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}
