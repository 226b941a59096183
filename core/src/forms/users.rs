use uuid::Uuid;

use super::validation::Validator;
use super::{cleared_or_optional, optional, FieldErrors, FormSpec};
use crate::cache::USERS;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{UserCreate, UserPublic, UserUpdate};

const FIELDS: &[&str] = &["email", "full_name", "password", "confirm_password"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddUserForm {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl FormSpec for AddUserForm {
    type Output = UserPublic;
    const FIELDS: &'static [&'static str] = FIELDS;

    fn validate(&self) -> FieldErrors {
        let mut v = Validator::new();
        v.email("email", &self.email);
        v.required("full_name", &self.full_name, "Full name is required");
        v.password("password", &self.password);
        v.confirmation("confirm_password", &self.password, &self.confirm_password);
        v.finish()
    }

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError> {
        client.build_create_user(&UserCreate {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            full_name: optional(&self.full_name),
            is_active: self.is_active,
            is_superuser: self.is_superuser,
        })
    }

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<UserPublic, ApiError> {
        client.parse_create_user(response)
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &[USERS]
    }

    fn success_message(&self) -> Option<String> {
        Some("User created successfully.".to_string())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Admin edit of another user. The password inputs start empty; leaving
/// them empty keeps the current password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditUserForm {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
    pub is_superuser: bool,
    pub is_active: bool,
    original: UserPublic,
}

impl EditUserForm {
    pub fn new(user: &UserPublic) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone().unwrap_or_default(),
            password: String::new(),
            confirm_password: String::new(),
            is_superuser: user.is_superuser,
            is_active: user.is_active,
            original: user.clone(),
        }
    }

    fn payload(&self) -> UserUpdate {
        UserUpdate {
            email: Some(self.email.trim().to_string()),
            password: (!self.password.is_empty()).then(|| self.password.clone()),
            full_name: cleared_or_optional(&self.full_name, self.original.full_name.as_deref()),
            is_active: Some(self.is_active),
            is_superuser: Some(self.is_superuser),
        }
    }
}

impl FormSpec for EditUserForm {
    type Output = UserPublic;
    const FIELDS: &'static [&'static str] = FIELDS;

    fn validate(&self) -> FieldErrors {
        let mut v = Validator::new();
        v.email("email", &self.email);
        if !self.password.is_empty() {
            v.password("password", &self.password);
            v.confirmation("confirm_password", &self.password, &self.confirm_password);
        }
        v.finish()
    }

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError> {
        client.build_update_user(self.id, &self.payload())
    }

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<UserPublic, ApiError> {
        client.parse_update_user(response)
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &[USERS]
    }

    fn success_message(&self) -> Option<String> {
        Some("User updated successfully.".to_string())
    }

    fn reset(&mut self) {
        *self = Self::new(&self.original);
    }
}
