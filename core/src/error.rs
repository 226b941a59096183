//! Error types for the admin API client.
//!
//! # Design
//! `NotFound`, `Unauthorized` and `Forbidden` get dedicated variants because
//! callers act on them differently: an auth failure ends the session, a
//! permission failure only shows a message. Any other 4xx body carrying a
//! FastAPI-style `detail` lands in `Validation` so forms can map it onto
//! fields. Transport failures stay separate from auth failures; a dropped
//! connection is never a logout.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::http::HttpResponse;
use crate::types::{ErrorBody, ErrorDetail};

/// Fallback shown when the server gives no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong.";

/// Errors returned by `ApiClient` parse methods and by the stateful layers
/// built on top of them.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound { detail: Option<String> },

    /// The server does not recognise the session (401, or a proxy login
    /// page instead of data).
    #[error("HTTP {status}: not authenticated")]
    Unauthorized { status: u16, detail: Option<String> },

    /// The session is valid but lacks the privileges for this call (403).
    #[error("forbidden")]
    Forbidden { detail: Option<String> },

    /// The server rejected the request with a `detail` body (422, 400, ...).
    #[error("HTTP {status}: request rejected")]
    Validation { status: u16, detail: ErrorDetail },

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The host could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// A request for the same query key is already outstanding and there is
    /// no cached data to hand out meanwhile.
    #[error("a request for this query is already in flight")]
    InFlight,
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_response(response: &HttpResponse) -> Self {
        let body: Option<ErrorBody> = serde_json::from_str(&response.body).ok();
        let plain = body.as_ref().and_then(|b| match &b.detail {
            ErrorDetail::Message(m) => Some(m.clone()),
            ErrorDetail::Errors(_) => None,
        });
        match response.status {
            404 => ApiError::NotFound { detail: plain },
            401 => ApiError::Unauthorized {
                status: response.status,
                detail: plain,
            },
            403 => ApiError::Forbidden { detail: plain },
            status => match body {
                Some(b) if (400..500).contains(&status) => ApiError::Validation {
                    status,
                    detail: b.detail,
                },
                _ => ApiError::HttpError {
                    status,
                    body: response.body.clone(),
                },
            },
        }
    }

    /// Message suitable for a toast: the server-provided text when there is
    /// one, the generic fallback otherwise.
    pub fn message(&self) -> String {
        match self {
            ApiError::NotFound { detail: Some(d) }
            | ApiError::Forbidden { detail: Some(d) }
            | ApiError::Unauthorized { detail: Some(d), .. } => d.clone(),
            ApiError::Validation { detail, .. } => match detail {
                ErrorDetail::Message(m) => m.clone(),
                ErrorDetail::Errors(errors) => errors
                    .first()
                    .map(|e| e.msg.clone())
                    .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
            },
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Field-level messages keyed by field name. Errors without a field
    /// location are left out; `message()` still reports them.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        if let ApiError::Validation {
            detail: ErrorDetail::Errors(errors),
            ..
        } = self
        {
            for err in errors {
                if let Some(field) = err.field() {
                    out.entry(field.to_string()).or_insert_with(|| err.msg.clone());
                }
            }
        }
        out
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_body_maps_to_fields() {
        let resp = HttpResponse::new(
            422,
            r#"{"detail":[{"loc":["body","current_password"],"msg":"Incorrect password","type":"value_error"}]}"#,
        );
        let err = ApiError::from_response(&resp);
        assert!(matches!(err, ApiError::Validation { status: 422, .. }));
        assert_eq!(err.message(), "Incorrect password");
        assert_eq!(
            err.field_errors().get("current_password").map(String::as_str),
            Some("Incorrect password")
        );
    }

    #[test]
    fn plain_detail_on_400_is_a_message() {
        let resp = HttpResponse::new(
            400,
            r#"{"detail":"The user with this email already exists in the system."}"#,
        );
        let err = ApiError::from_response(&resp);
        assert_eq!(err.message(), "The user with this email already exists in the system.");
        assert!(err.field_errors().is_empty());
    }

    #[test]
    fn unauthorized_is_an_auth_failure() {
        let resp = HttpResponse::new(401, r#"{"detail":"Could not validate credentials"}"#);
        let err = ApiError::from_response(&resp);
        assert!(err.is_auth_failure());
        assert_eq!(err.message(), "Could not validate credentials");
    }

    #[test]
    fn forbidden_is_not_an_auth_failure() {
        let resp = HttpResponse::new(403, r#"{"detail":"Not enough permissions"}"#);
        let err = ApiError::from_response(&resp);
        assert!(matches!(err, ApiError::Forbidden { .. }));
        assert!(!err.is_auth_failure());
        assert_eq!(err.message(), "Not enough permissions");
    }

    #[test]
    fn server_error_falls_back_to_generic_message() {
        let err = ApiError::from_response(&HttpResponse::new(500, "Internal Server Error"));
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
        assert_eq!(err.message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn transport_is_not_an_auth_failure() {
        let err = ApiError::Transport("connection refused".to_string());
        assert!(!err.is_auth_failure());
        assert!(err.is_transport());
        assert_eq!(err.message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn not_found_keeps_detail() {
        let resp = HttpResponse::new(404, r#"{"detail":"Item not found"}"#);
        let err = ApiError::from_response(&resp);
        assert!(matches!(err, ApiError::NotFound { .. }));
        assert_eq!(err.message(), "Item not found");
    }
}
