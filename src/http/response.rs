//! Response envelope: `{status, error?, data?}`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::storage::FieldError;

/// Envelope status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Request succeeded
    Ok,
    /// Request failed; `error` explains why
    Error,
}

/// Uniform JSON body for every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Outcome
    pub status: Status,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            status: Status::Ok,
            error: None,
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    /// Failed envelope carrying a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error: Some(message.into()),
            data: None,
        }
    }

    /// Failed envelope listing every field that failed validation.
    pub fn validation(errors: &[FieldError]) -> Self {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self::error(message)
    }
}

/// A status code plus an envelope.
pub(crate) fn respond<T: Serialize>(status: StatusCode, envelope: Envelope<T>) -> Response {
    (status, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::validate;

    #[test]
    fn test_ok_omits_error() {
        let json = serde_json::to_value(Envelope::ok(serde_json::json!({"id": 1}))).unwrap();
        assert_eq!(json, serde_json::json!({"status": "Ok", "data": {"id": 1}}));
    }

    #[test]
    fn test_error_omits_data() {
        let json = serde_json::to_value(Envelope::error("invalid id")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "Error", "error": "invalid id"}));
    }

    #[test]
    fn test_validation_joins_messages() {
        let errors = validate("", "ana@example.com", 101).unwrap_err();
        let envelope = Envelope::validation(&errors);
        assert_eq!(
            envelope.error.as_deref(),
            Some("field 'name' is required, field 'age' must be less than or equal to 100")
        );
    }
}
