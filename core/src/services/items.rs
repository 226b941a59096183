//! Item endpoints. Ownership is enforced by the server.

use uuid::Uuid;

use super::ITEMS_URL;
use crate::client::{parse_json, ApiClient};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::{ApiRequestOptions, RequestBody};
use crate::types::{ItemCreate, ItemPublic, ItemUpdate, ItemsPublic, Message};

const ITEM_BY_ID_URL: &str = "/api/v1/items/{id}";

impl ApiClient {
    pub fn build_read_items(&self, skip: u64, limit: u64) -> HttpRequest {
        self.request(
            ApiRequestOptions::new(HttpMethod::Get, ITEMS_URL)
                .query_param("skip", skip)
                .query_param("limit", limit),
        )
    }

    pub fn parse_read_items(&self, response: HttpResponse) -> Result<ItemsPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_create_item(&self, input: &ItemCreate) -> Result<HttpRequest, ApiError> {
        Ok(self.request(
            ApiRequestOptions::new(HttpMethod::Post, ITEMS_URL).body(RequestBody::json(input)?),
        ))
    }

    pub fn parse_create_item(&self, response: HttpResponse) -> Result<ItemPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_read_item(&self, id: Uuid) -> HttpRequest {
        self.request(ApiRequestOptions::new(HttpMethod::Get, ITEM_BY_ID_URL).path_param("id", id))
    }

    pub fn parse_read_item(&self, response: HttpResponse) -> Result<ItemPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_update_item(&self, id: Uuid, input: &ItemUpdate) -> Result<HttpRequest, ApiError> {
        Ok(self.request(
            ApiRequestOptions::new(HttpMethod::Put, ITEM_BY_ID_URL)
                .path_param("id", id)
                .body(RequestBody::json(input)?),
        ))
    }

    pub fn parse_update_item(&self, response: HttpResponse) -> Result<ItemPublic, ApiError> {
        parse_json(response, 200)
    }

    pub fn build_delete_item(&self, id: Uuid) -> HttpRequest {
        self.request(
            ApiRequestOptions::new(HttpMethod::Delete, ITEM_BY_ID_URL).path_param("id", id),
        )
    }

    pub fn parse_delete_item(&self, response: HttpResponse) -> Result<Message, ApiError> {
        parse_json(response, 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:8000")
    }

    #[test]
    fn create_item_keeps_empty_description() {
        let req = client()
            .build_create_item(&ItemCreate {
                title: "Report".to_string(),
                description: Some(String::new()),
            })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:8000/api/v1/items/");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"title": "Report", "description": ""}));
    }

    #[test]
    fn update_item_is_put() {
        let req = client()
            .build_update_item(
                Uuid::nil(),
                &ItemUpdate {
                    title: Some("New".to_string()),
                    description: None,
                },
            )
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(
            req.path,
            "http://localhost:8000/api/v1/items/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn delete_item_has_no_body() {
        let req = client().build_delete_item(Uuid::nil());
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn read_item_not_found() {
        let err = client()
            .parse_read_item(HttpResponse::new(404, r#"{"detail":"Item not found"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[test]
    fn read_items_bad_json() {
        let err = client()
            .parse_read_items(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }
}
