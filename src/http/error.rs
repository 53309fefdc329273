//! HTTP errors and their status codes

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::response::{respond, Envelope};
use crate::storage::{FieldError, StorageError};

/// Message shown instead of storage error detail in production.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal storage error";

/// Everything a handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body was empty
    #[error("empty body")]
    EmptyBody,

    /// Body was not a valid student JSON object
    #[error("{0}")]
    MalformedJson(String),

    /// One or more field constraints failed
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Path id is not an integer
    #[error("invalid id")]
    InvalidId,

    /// Update body had no id
    #[error("please pass the id to update this student")]
    MissingId,

    /// Storage rejected an argument
    #[error("{0}")]
    InvalidArgument(String),

    /// No student with this id
    #[error("student {0} not found")]
    NotFound(i64),

    /// Store failure; `detail` is `None` when it must not reach the client.
    #[error("{}", .detail.as_deref().unwrap_or(INTERNAL_ERROR_MESSAGE))]
    Internal {
        /// Error text, when it may be shown
        detail: Option<String>,
    },
}

impl ApiError {
    /// Translate a storage error, hiding store internals unless `expose`.
    #[must_use]
    pub fn from_storage(err: StorageError, expose: bool) -> Self {
        match err {
            StorageError::NotFound { id } => Self::NotFound(id),
            StorageError::InvalidArgument(message) => Self::InvalidArgument(message),
            err @ (StorageError::Query { .. } | StorageError::Connection { .. }) => {
                tracing::error!(error = %err, source = ?std::error::Error::source(&err), "Storage failure");
                Self::Internal {
                    detail: expose.then(|| err.to_string()),
                }
            }
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmptyBody
            | Self::MalformedJson(_)
            | Self::Validation(_)
            | Self::InvalidId
            | Self::MissingId
            | Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let envelope = match &self {
            Self::Validation(errors) => Envelope::validation(errors),
            other => Envelope::error(other.to_string()),
        };
        respond(status, envelope)
    }
}
