//! Error types shared by every layer of the service.
//!
//! Each variant is a distinct error kind that survives all the way to the RPC
//! envelope, so callers can tell a bad request apart from a missing type or an
//! unavailable index.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while serving a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Malformed filter, unknown key, bad GUID, negative pagination.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown object type.
    #[error("not found: {0}")]
    NotFound(String),

    /// Credentials missing or not recognised for the requested scope.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// Index engine unavailable. Every operation is read-only, so retrying is safe.
    #[error("index unavailable: {0}")]
    TransientIndex(String),

    /// Unexpected invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Wire name of an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidArgumentError,
    NotFoundError,
    AuthorizationError,
    TransientIndexError,
    InternalError,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgumentError => "InvalidArgumentError",
            ErrorKind::NotFoundError => "NotFoundError",
            ErrorKind::AuthorizationError => "AuthorizationError",
            ErrorKind::TransientIndexError => "TransientIndexError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl SearchError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::InvalidArgument(_) => ErrorKind::InvalidArgumentError,
            SearchError::NotFound(_) => ErrorKind::NotFoundError,
            SearchError::Authorization(_) => ErrorKind::AuthorizationError,
            SearchError::TransientIndex(_) => ErrorKind::TransientIndexError,
            SearchError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// JSON-RPC error code for this kind.
    pub fn code(&self) -> i64 {
        match self {
            SearchError::InvalidArgument(_) => -32602,
            SearchError::NotFound(_) => -32001,
            SearchError::Authorization(_) => -32002,
            SearchError::TransientIndex(_) => -32003,
            SearchError::Internal(_) => -32603,
        }
    }

    /// Whether the caller may simply re-issue the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::TransientIndex(_))
    }

    /// HTTP status used when the error ends an HTTP exchange.
    pub fn status(&self) -> StatusCode {
        match self {
            SearchError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            SearchError::NotFound(_) => StatusCode::NOT_FOUND,
            SearchError::Authorization(_) => StatusCode::UNAUTHORIZED,
            SearchError::TransientIndex(_) => StatusCode::SERVICE_UNAVAILABLE,
            SearchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message without the kind prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            SearchError::InvalidArgument(m)
            | SearchError::NotFound(m)
            | SearchError::Authorization(m)
            | SearchError::TransientIndex(m)
            | SearchError::Internal(m) => m,
        }
    }
}

/// JSON error object: `{name, code, message}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub name: String,
    pub code: i64,
    pub message: String,
}

impl ErrorBody {
    pub fn new(name: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code,
            message: message.into(),
        }
    }
}

impl From<&SearchError> for ErrorBody {
    fn from(e: &SearchError) -> Self {
        Self {
            name: e.kind().name().to_string(),
            code: e.code(),
            message: e.message().to_string(),
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::InvalidArgument(format!("malformed parameters: {}", e))
    }
}

/// Plain HTTP routes answer a failed request with the error object alone.
impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        tracing::warn!("Request failed: {}", self);
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}
