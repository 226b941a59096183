//! Login endpoints, including the reverse-proxy session variant.

use crate::client::{parse_json, ApiClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::{ApiRequestOptions, RequestBody};
use crate::types::{LoginForm, Token, UserPublic};

pub const USERINFO_PATH: &str = "/oauth2/userinfo";
pub const SIGN_OUT_PATH: &str = "/oauth2/sign_out";

impl ApiClient {
    /// OAuth2 password login; the body is form-encoded.
    pub fn build_login_access_token(&self, form: &LoginForm) -> HttpRequest {
        self.request(
            ApiRequestOptions::new(HttpMethod::Post, "/api/v1/login/access-token").body(
                RequestBody::Form(vec![
                    ("username".to_string(), form.username.clone()),
                    ("password".to_string(), form.password.clone()),
                ]),
            ),
        )
    }

    pub fn parse_login_access_token(&self, response: HttpResponse) -> Result<Token, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_test_token(&self) -> HttpRequest {
        self.request(ApiRequestOptions::new(HttpMethod::Post, "/api/v1/login/test-token"))
    }

    pub fn parse_test_token(&self, response: HttpResponse) -> Result<UserPublic, ApiError> {
        parse_json(response, 200)
    }

    /// Current user as reported by the authenticating reverse proxy.
    pub fn build_read_user_info(&self) -> HttpRequest {
        self.request(ApiRequestOptions::new(HttpMethod::Get, USERINFO_PATH))
    }

    /// The proxy answers unauthenticated requests with its HTML login page,
    /// so anything that is not JSON counts as "not signed in".
    pub fn parse_read_user_info(&self, response: HttpResponse) -> Result<UserPublic, ApiError> {
        if response.is_success() && !response.is_json() {
            return Err(ApiError::Unauthorized {
                status: response.status,
                detail: Some("Not authenticated".to_string()),
            });
        }
        parse_json(response, 200)
    }

    pub fn sign_out_url(&self) -> String {
        format!("{}{SIGN_OUT_PATH}", self.base_url())
    }
}
