//! Storage errors
//!
//! TigerStyle: Kinds are distinguished by variant, never by message text.

use std::error::Error as StdError;

/// Boxed underlying cause, preserved for diagnostics.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors returned by every [`StorageBackend`](super::StorageBackend).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Store unreachable or table provisioning failed. Fatal at startup.
    #[error("connection failed: {message}")]
    Connection {
        /// What was being attempted
        message: String,
        /// Underlying driver error, if any
        #[source]
        source: Option<BoxError>,
    },

    /// No student row matches the id.
    #[error("student {id} not found")]
    NotFound {
        /// The id that was looked up
        id: i64,
    },

    /// A query or statement failed after the store was reachable.
    #[error("{operation} failed: {source}")]
    Query {
        /// Contract operation that failed
        operation: &'static str,
        /// Underlying driver error or injected fault
        #[source]
        source: BoxError,
    },

    /// Rejected before reaching the store.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl StorageError {
    /// Connection or provisioning failure with a driver cause.
    pub fn connection(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Connection or provisioning failure without an underlying cause.
    pub fn connection_msg(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Query failure for the named operation.
    pub fn query(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Query {
            operation,
            source: source.into(),
        }
    }

    /// Is this a "no such record" error?
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Is this a failure of the store itself rather than of the caller's input?
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Query { .. })
    }
}
