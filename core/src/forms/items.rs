use uuid::Uuid;

use super::validation::{Validator, MAX_TEXT_LEN};
use super::{FieldErrors, FormSpec};
use crate::cache::ITEMS;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{ItemCreate, ItemPublic, ItemUpdate};

const FIELDS: &[&str] = &["title", "description"];

fn validate_item(title: &str, description: &str) -> FieldErrors {
    let mut v = Validator::new();
    if v.required("title", title, "Title is required") {
        v.max_len("title", title, MAX_TEXT_LEN);
    }
    v.max_len("description", description, MAX_TEXT_LEN);
    v.finish()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddItemForm {
    pub title: String,
    pub description: String,
}

impl AddItemForm {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

impl FormSpec for AddItemForm {
    type Output = ItemPublic;
    const FIELDS: &'static [&'static str] = FIELDS;

    fn validate(&self) -> FieldErrors {
        validate_item(&self.title, &self.description)
    }

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError> {
        // An empty description is sent as-is; the server stores "".
        client.build_create_item(&ItemCreate {
            title: self.title.clone(),
            description: Some(self.description.clone()),
        })
    }

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<ItemPublic, ApiError> {
        client.parse_create_item(response)
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &[ITEMS]
    }

    fn success_message(&self) -> Option<String> {
        Some("Item created successfully.".to_string())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Edits an existing item, pre-filled from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditItemForm {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    original: ItemPublic,
}

impl EditItemForm {
    pub fn new(item: &ItemPublic) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            description: item.description.clone().unwrap_or_default(),
            original: item.clone(),
        }
    }
}

impl FormSpec for EditItemForm {
    type Output = ItemPublic;
    const FIELDS: &'static [&'static str] = FIELDS;

    fn validate(&self) -> FieldErrors {
        validate_item(&self.title, &self.description)
    }

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError> {
        client.build_update_item(
            self.id,
            &ItemUpdate {
                title: Some(self.title.clone()),
                description: Some(self.description.clone()),
            },
        )
    }

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<ItemPublic, ApiError> {
        client.parse_update_item(response)
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &[ITEMS]
    }

    fn success_message(&self) -> Option<String> {
        Some("Item updated successfully.".to_string())
    }

    fn reset(&mut self) {
        *self = Self::new(&self.original);
    }
}
