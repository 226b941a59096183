//! Request layer: turns a typed call descriptor into an `HttpRequest`.
//!
//! # Design
//! Every service call is described by an `ApiRequestOptions` value (method,
//! URL template, path and query parameters, body). `build_request` is the
//! only place that knows how those pieces become a URL and headers, so the
//! services stay one-liners.

use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};

pub const JSON_MEDIA_TYPE: &str = "application/json";
pub const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Base URL and credentials shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    None,
    Json(String),
    Form(Vec<(String, String)>),
}

impl RequestBody {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_string(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::SerializationError(e.to_string()))
    }
}

/// A typed call descriptor.
#[derive(Debug, Clone)]
pub struct ApiRequestOptions {
    pub method: HttpMethod,
    /// Path template relative to the base URL, e.g. `/api/v1/items/{id}`.
    pub url: &'static str,
    pub path: Vec<(&'static str, String)>,
    pub query: Vec<(&'static str, String)>,
    pub body: RequestBody,
}

impl ApiRequestOptions {
    pub fn new(method: HttpMethod, url: &'static str) -> Self {
        Self {
            method,
            url,
            path: Vec::new(),
            query: Vec::new(),
            body: RequestBody::None,
        }
    }

    pub fn path_param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.path.push((name, value.to_string()));
        self
    }

    pub fn query_param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.query.push((name, value.to_string()));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

/// Build the concrete request for `options` against `config`.
pub fn build_request(config: &ApiConfig, options: ApiRequestOptions) -> HttpRequest {
    let mut url = format!("{}{}", config.base_url, options.url);
    for (name, value) in &options.path {
        url = url.replace(&format!("{{{name}}}"), &urlencoding::encode(value));
    }
    if !options.query.is_empty() {
        url.push('?');
        url.push_str(&encode_pairs(
            options.query.iter().map(|(k, v)| (*k, v.as_str())),
        ));
    }

    let mut headers = Vec::new();
    if let Some(token) = &config.token {
        headers.push(("authorization".to_string(), format!("Bearer {token}")));
    }
    let body = match options.body {
        RequestBody::None => None,
        RequestBody::Json(json) => {
            headers.push(("content-type".to_string(), JSON_MEDIA_TYPE.to_string()));
            Some(json)
        }
        RequestBody::Form(fields) => {
            headers.push(("content-type".to_string(), FORM_MEDIA_TYPE.to_string()));
            Some(encode_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))))
        }
    };

    debug!(method = options.method.as_str(), url = %url, "built request");
    HttpRequest {
        method: options.method,
        path: url,
        headers,
        body,
    }
}

fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
