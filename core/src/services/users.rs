//! User endpoints: admin CRUD, self-service profile and signup.

use uuid::Uuid;

use super::USERS_URL;
use crate::client::{parse_json, ApiClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::{ApiRequestOptions, RequestBody};
use crate::types::{
    Message, UpdatePassword, UserCreate, UserPublic, UserRegister, UserUpdate, UserUpdateMe,
    UsersPublic,
};

const USER_ME_URL: &str = "/api/v1/users/me";
const USER_BY_ID_URL: &str = "/api/v1/users/{user_id}";

impl ApiClient {
    pub fn build_read_users(&self, skip: u64, limit: u64) -> HttpRequest {
        self.request(
            ApiRequestOptions::new(HttpMethod::Get, USERS_URL)
                .query_param("skip", skip)
                .query_param("limit", limit),
        )
    }

    pub fn parse_read_users(&self, response: HttpResponse) -> Result<UsersPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_create_user(&self, input: &UserCreate) -> Result<HttpRequest, ApiError> {
        Ok(self.request(
            ApiRequestOptions::new(HttpMethod::Post, USERS_URL).body(RequestBody::json(input)?),
        ))
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<UserPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_read_user_me(&self) -> HttpRequest {
        self.request(ApiRequestOptions::new(HttpMethod::Get, USER_ME_URL))
    }

    pub fn parse_read_user_me(&self, response: HttpResponse) -> Result<UserPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_update_user_me(&self, input: &UserUpdateMe) -> Result<HttpRequest, ApiError> {
        Ok(self.request(
            ApiRequestOptions::new(HttpMethod::Patch, USER_ME_URL).body(RequestBody::json(input)?),
        ))
    }

    pub fn parse_update_user_me(&self, response: HttpResponse) -> Result<UserPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_delete_user_me(&self) -> HttpRequest {
        self.request(ApiRequestOptions::new(HttpMethod::Delete, USER_ME_URL))
    }

    pub fn parse_delete_user_me(&self, response: HttpResponse) -> Result<Message, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_update_password_me(
        &self,
        input: &UpdatePassword,
    ) -> Result<HttpRequest, ApiError> {
        Ok(self.request(
            ApiRequestOptions::new(HttpMethod::Patch, "/api/v1/users/me/password")
                .body(RequestBody::json(input)?),
        ))
    }

    pub fn parse_update_password_me(&self, response: HttpResponse) -> Result<Message, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_register_user(&self, input: &UserRegister) -> Result<HttpRequest, ApiError> {
        Ok(self.request(
            ApiRequestOptions::new(HttpMethod::Post, "/api/v1/users/signup")
                .body(RequestBody::json(input)?),
        ))
    }

    pub fn parse_register_user(&self, response: HttpResponse) -> Result<UserPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_read_user_by_id(&self, user_id: Uuid) -> HttpRequest {
        self.request(
            ApiRequestOptions::new(HttpMethod::Get, USER_BY_ID_URL).path_param("user_id", user_id),
        )
    }

    pub fn parse_read_user_by_id(&self, response: HttpResponse) -> Result<UserPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_update_user(
        &self,
        user_id: Uuid,
        input: &UserUpdate,
    ) -> Result<HttpRequest, ApiError> {
        Ok(self.request(
            ApiRequestOptions::new(HttpMethod::Patch, USER_BY_ID_URL)
                .path_param("user_id", user_id)
                .body(RequestBody::json(input)?),
        ))
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<UserPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_delete_user(&self, user_id: Uuid) -> HttpRequest {
        self.request(
            ApiRequestOptions::new(HttpMethod::Delete, USER_BY_ID_URL)
                .path_param("user_id", user_id),
        )
    }

    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<Message, ApiError> {
        parse_json(response, 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8000").with_token("tok")
    }

    #[test]
    fn read_users_carries_paging_and_token() {
        let req = client().build_read_users(20, 10);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:8000/api/v1/users/?skip=20&limit=10");
        assert_eq!(req.header("authorization"), Some("Bearer tok"));
    }

    #[test]
    fn update_user_is_patch_by_id() {
        let id = Uuid::nil();
        let req = client()
            .build_update_user(
                id,
                &UserUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(
            req.path,
            "http://localhost:8000/api/v1/users/00000000-0000-0000-0000-000000000000"
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"is_active": false}));
    }

    #[test]
    fn password_change_targets_me_endpoint() {
        let req = client()
            .build_update_password_me(&UpdatePassword {
                current_password: "old-password".to_string(),
                new_password: "new-password".to_string(),
            })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.path, "http://localhost:8000/api/v1/users/me/password");
    }

    #[test]
    fn delete_me_parses_message() {
        let resp = HttpResponse::new(200, r#"{"message":"User deleted successfully"}"#);
        let msg = client().parse_delete_user_me(resp).unwrap();
        assert_eq!(msg.message, "User deleted successfully");
    }

    #[test]
    fn read_users_parses_page() {
        let page = client()
            .parse_read_users(HttpResponse::new(
                200,
                r#"{"data":[{"id":"00000000-0000-0000-0000-000000000001","email":"a@b.co","full_name":"A","is_active":true,"is_superuser":true}],"count":7}"#,
            ))
            .unwrap();
        assert_eq!(page.count, 7);
        assert!(page.data[0].is_superuser);
    }

    #[test]
    fn non_admin_listing_is_forbidden() {
        let resp = HttpResponse::new(
            403,
            r#"{"detail":"The user doesn't have enough privileges"}"#,
        );
        let err = client().parse_read_users(resp).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden { .. }));
    }
}
