//! Error types for the Papertok data-access layer
//!
//! Every access function resolves or rejects with an [`AppError`]. The
//! taxonomy the UI cares about is small:
//! - `NotFound` for ids that do not resolve (where no fallback applies)
//! - `Validation` for malformed mutation payloads
//! - `RemoteUnavailable` / `Upstream` for backend failures in remote mode
//!
//! The gateway renders the same type as a JSON error envelope, which the
//! remote adapter unwraps again so messages travel verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationFailed,
    InvalidFormat,

    // Resource errors (4xxx)
    NotFound,
    UserNotFound,
    KnowledgeBaseNotFound,
    PaperNotFound,
    PostNotFound,
    CommentNotFound,

    // External service errors (8xxx)
    RemoteUnavailable,
    UpstreamError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationFailed => 1001,
            ErrorCode::InvalidFormat => 1003,

            ErrorCode::NotFound => 4001,
            ErrorCode::UserNotFound => 4002,
            ErrorCode::KnowledgeBaseNotFound => 4003,
            ErrorCode::PaperNotFound => 4004,
            ErrorCode::PostNotFound => 4005,
            ErrorCode::CommentNotFound => 4006,

            ErrorCode::RemoteUnavailable => 8001,
            ErrorCode::UpstreamError => 8002,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Kind of entity a `NotFound` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    KnowledgeBase,
    Paper,
    Post,
    Comment,
    Other,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Resource::User => "user",
            Resource::KnowledgeBase => "knowledge base",
            Resource::Paper => "paper",
            Resource::Post => "post",
            Resource::Comment => "comment",
            Resource::Other => "resource",
        };
        f.write_str(name)
    }
}

fn not_found_text(resource: &Resource, id: &str, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("Resource not found: {} with id {}", resource, id),
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    /// `message` is the backend's text when the 404 came from a remote call
    #[error("{}", not_found_text(.resource, .id, .message))]
    NotFound {
        resource: Resource,
        id: String,
        message: Option<String>,
    },

    /// Transport-level failure talking to the backend
    #[error("Remote backend unavailable: {message}")]
    RemoteUnavailable { message: String },

    /// The backend answered with an error; `message` is its text verbatim
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(resource: Resource, id: impl ToString) -> Self {
        AppError::NotFound {
            resource,
            id: id.to_string(),
            message: None,
        }
    }

    pub fn validation(message: impl Into<String>, field: Option<&str>) -> Self {
        AppError::Validation {
            message: message.into(),
            field: field.map(str::to_string),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationFailed,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::NotFound { resource, .. } => match resource {
                Resource::User => ErrorCode::UserNotFound,
                Resource::KnowledgeBase => ErrorCode::KnowledgeBaseNotFound,
                Resource::Paper => ErrorCode::PaperNotFound,
                Resource::Post => ErrorCode::PostNotFound,
                Resource::Comment => ErrorCode::CommentNotFound,
                Resource::Other => ErrorCode::NotFound,
            },
            AppError::RemoteUnavailable { .. } => ErrorCode::RemoteUnavailable,
            AppError::Upstream { .. } => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::InvalidFormat { .. } => {
                StatusCode::BAD_REQUEST
            }

            AppError::NotFound { .. } => StatusCode::NOT_FOUND,

            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }

            AppError::RemoteUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,

            AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::RemoteUnavailable {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors.field_errors().keys().next().map(|f| f.to_string());
        AppError::Validation {
            message: errors.to_string(),
            field,
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();
        let field = match &self {
            AppError::Validation { field, .. } => field.clone(),
            _ => None,
        };

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}
