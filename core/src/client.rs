//! Stateless HTTP request builder and response parser for the admin API.
//!
//! # Design
//! `ApiClient` holds only an `ApiConfig` (base URL plus bearer token) and
//! carries no other state between calls. Each endpoint is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`; the endpoints themselves live in
//! `crate::services`, one module per resource. The caller executes the
//! actual HTTP round-trip, keeping the core deterministic.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::request::{build_request, ApiConfig, ApiRequestOptions};
use crate::transport::Transport;

/// Synchronous, stateless client for the admin API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            config: ApiConfig::new(base_url),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.config.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.config.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub(crate) fn request(&self, options: ApiRequestOptions) -> HttpRequest {
        build_request(&self.config, options)
    }

    /// Build, execute and parse in one go for hosts with a blocking transport.
    pub fn call<T, B, P>(
        &self,
        transport: &dyn Transport,
        build: B,
        parse: P,
    ) -> Result<T, ApiError>
    where
        B: FnOnce(&Self) -> Result<HttpRequest, ApiError>,
        P: FnOnce(&Self, HttpResponse) -> Result<T, ApiError>,
    {
        let request = build(self)?;
        let response = transport
            .execute(request)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        parse(self, response)
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
pub(crate) fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    Err(ApiError::from_response(response))
}

pub(crate) fn parse_json<T: DeserializeOwned>(
    response: HttpResponse,
    expected: u16,
) -> Result<T, ApiError> {
    check_status(&response, expected)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn token_can_be_replaced_and_cleared() {
        let mut client = ApiClient::new("http://localhost:8000").with_token("a");
        assert_eq!(client.token(), Some("a"));
        client.set_token(None);
        assert_eq!(client.token(), None);
    }

    #[test]
    fn parse_json_rejects_wrong_status() {
        let err = parse_json::<Message>(HttpResponse::new(500, "boom"), 200).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }

    #[test]
    fn parse_json_reports_bad_body() {
        let err = parse_json::<Message>(HttpResponse::new(200, "not json"), 200).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }
}
