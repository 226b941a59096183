//! Forms on the user settings page.

use super::validation::Validator;
use super::{cleared_or_optional, AfterSuccess, FieldErrors, FormSpec};
use crate::app::AppContext;
use crate::cache::{CURRENT_USER, USERS};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::storage::Storage;
use crate::types::{Message, UpdatePassword, UserPublic, UserUpdateMe};

/// Profile card: read-only until `start_editing`, back to read-only after
/// a successful save or a cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInformationForm {
    pub full_name: String,
    pub email: String,
    editing: bool,
    original: UserPublic,
}

impl UserInformationForm {
    pub fn new(user: &UserPublic) -> Self {
        Self {
            full_name: user.full_name.clone().unwrap_or_default(),
            email: user.email.clone(),
            editing: false,
            original: user.clone(),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn start_editing(&mut self) {
        self.editing = true;
    }
}

impl FormSpec for UserInformationForm {
    type Output = UserPublic;
    const FIELDS: &'static [&'static str] = &["full_name", "email"];

    fn validate(&self) -> FieldErrors {
        let mut v = Validator::new();
        v.email("email", &self.email);
        v.finish()
    }

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError> {
        client.build_update_user_me(&UserUpdateMe {
            email: Some(self.email.trim().to_string()),
            full_name: cleared_or_optional(&self.full_name, self.original.full_name.as_deref()),
        })
    }

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<UserPublic, ApiError> {
        client.parse_update_user_me(response)
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &[CURRENT_USER, USERS]
    }

    fn success_message(&self) -> Option<String> {
        Some("User updated successfully.".to_string())
    }

    fn after_success(&self) -> AfterSuccess {
        AfterSuccess::Stay
    }

    fn accept(&mut self, output: &UserPublic) {
        *self = Self::new(output);
    }

    fn on_success<S: Storage>(&self, ctx: &mut AppContext<S>, output: &UserPublic) {
        ctx.apply_current_user(Ok(output.clone()));
    }

    fn reset(&mut self) {
        *self = Self::new(&self.original);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl FormSpec for ChangePasswordForm {
    type Output = Message;
    const FIELDS: &'static [&'static str] =
        &["current_password", "new_password", "confirm_password"];

    fn validate(&self) -> FieldErrors {
        let mut v = Validator::new();
        v.required("current_password", &self.current_password, "Current password is required");
        v.password("new_password", &self.new_password);
        v.confirmation("confirm_password", &self.new_password, &self.confirm_password);
        v.finish()
    }

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError> {
        client.build_update_password_me(&UpdatePassword {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        })
    }

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<Message, ApiError> {
        client.parse_update_password_me(response)
    }

    fn success_message(&self) -> Option<String> {
        Some("Password updated successfully.".to_string())
    }

    fn after_success(&self) -> AfterSuccess {
        AfterSuccess::Reset
    }

    /// A plain "Incorrect password" rejection belongs to this field.
    fn fallback_error_field(&self) -> Option<&'static str> {
        Some("current_password")
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Permanently deletes the signed-in account, then ends the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteAccountForm;

impl FormSpec for DeleteAccountForm {
    type Output = Message;
    const FIELDS: &'static [&'static str] = &[];

    fn validate(&self) -> FieldErrors {
        FieldErrors::new()
    }

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError> {
        Ok(client.build_delete_user_me())
    }

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<Message, ApiError> {
        client.parse_delete_user_me(response)
    }

    fn invalidates(&self) -> &'static [&'static str] {
        &[CURRENT_USER]
    }

    fn success_message(&self) -> Option<String> {
        Some("Your account has been successfully deleted.".to_string())
    }

    fn on_success<S: Storage>(&self, ctx: &mut AppContext<S>, _output: &Message) {
        ctx.logout();
    }

    fn reset(&mut self) {}
}
