//! Error responses in the `{"detail": ...}` shape the client parses.

use axum::{
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// One entry of a 422 `detail` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn body(field: &str, msg: impl Into<String>, kind: &str) -> Self {
        Self {
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Could not validate credentials")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("validation failed")]
    Validation(Vec<FieldError>),
}

impl ApiError {
    pub fn not_enough_privileges() -> Self {
        ApiError::Forbidden("The user doesn't have enough privileges".to_string())
    }

    pub fn field(field: &str, msg: impl Into<String>, kind: &str) -> Self {
        ApiError::Validation(vec![FieldError::body(field, msg, kind)])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = match &self {
            ApiError::Validation(errors) => json!({ "detail": errors }),
            other => json!({ "detail": other.to_string() }),
        };
        if matches!(self, ApiError::Unauthorized) {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response();
        }
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![FieldError {
            loc: vec!["body".to_string()],
            msg: rejection.body_text(),
            kind: "json_invalid".to_string(),
        }])
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::Validation(vec![FieldError {
            loc: vec!["body".to_string()],
            msg: rejection.body_text(),
            kind: "missing".to_string(),
        }])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(vec![FieldError {
            loc: vec!["query".to_string()],
            msg: rejection.body_text(),
            kind: "int_parsing".to_string(),
        }])
    }
}
