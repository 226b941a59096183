//! Guest-only forms: sign in and sign up.

use super::validation::{Validator, MIN_FULL_NAME_LEN};
use super::{optional, FieldErrors, FormSpec};
use crate::app::AppContext;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::routes::Route;
use crate::storage::Storage;
use crate::types::{LoginForm, Token, UserPublic, UserRegister};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInForm {
    /// The account's email address.
    pub username: String,
    pub password: String,
}

impl FormSpec for SignInForm {
    type Output = Token;
    const FIELDS: &'static [&'static str] = &["username", "password"];

    fn validate(&self) -> FieldErrors {
        let mut v = Validator::new();
        if v.required("username", &self.username, "Username is required") {
            v.email("username", &self.username);
        }
        v.required("password", &self.password, "Password is required");
        v.finish()
    }

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError> {
        Ok(client.build_login_access_token(&LoginForm {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }))
    }

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<Token, ApiError> {
        client.parse_login_access_token(response)
    }

    fn success_message(&self) -> Option<String> {
        None
    }

    fn on_success<S: Storage>(&self, ctx: &mut AppContext<S>, token: &Token) {
        ctx.complete_login(token);
    }

    /// "Incorrect email or password" shows under the password input.
    fn fallback_error_field(&self) -> Option<&'static str> {
        Some("password")
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl FormSpec for SignUpForm {
    type Output = UserPublic;
    const FIELDS: &'static [&'static str] = &["full_name", "email", "password", "confirm_password"];

    fn validate(&self) -> FieldErrors {
        let mut v = Validator::new();
        if v.required("full_name", &self.full_name, "Full Name is required") {
            v.min_len(
                "full_name",
                &self.full_name,
                MIN_FULL_NAME_LEN,
                "Full Name must be at least 3 characters",
            );
        }
        v.email("email", &self.email);
        v.password("password", &self.password);
        v.confirmation("confirm_password", &self.password, &self.confirm_password);
        v.finish()
    }

    fn build(&self, client: &ApiClient) -> Result<HttpRequest, ApiError> {
        client.build_register_user(&UserRegister {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            full_name: optional(&self.full_name),
        })
    }

    fn parse(&self, client: &ApiClient, response: HttpResponse) -> Result<UserPublic, ApiError> {
        client.parse_register_user(response)
    }

    fn success_message(&self) -> Option<String> {
        Some("Your account has been created. Please log in.".to_string())
    }

    fn on_success<S: Storage>(&self, ctx: &mut AppContext<S>, _user: &UserPublic) {
        ctx.navigator.navigate(Route::Login);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::forms::testing::Recorder;
    use crate::forms::Form;
    use crate::storage::MemoryStorage;

    fn guest() -> AppContext<MemoryStorage> {
        AppContext::new(ClientConfig::default(), MemoryStorage::new())
    }

    #[test]
    fn sign_in_posts_form_and_logs_in() {
        let mut ctx = guest();
        ctx.open("/login");
        let transport = Recorder::replying(200, r#"{"access_token":"jwt","token_type":"bearer"}"#);
        let mut form = Form::new(SignInForm {
            username: "admin@example.com".to_string(),
            password: "changethis".to_string(),
        });
        form.submit(&mut ctx, &transport).unwrap();

        let requests = transport.requests.borrow();
        assert_eq!(
            requests[0].body.as_deref(),
            Some("username=admin%40example.com&password=changethis")
        );
        assert!(ctx.is_logged_in());
        assert_eq!(ctx.client.token(), Some("jwt"));
        assert_eq!(ctx.navigator.route(), Some(&Route::Home));
    }

    #[test]
    fn bad_credentials_show_under_password() {
        let mut ctx = guest();
        let transport = Recorder::replying(400, r#"{"detail":"Incorrect email or password"}"#);
        let mut form = Form::new(SignInForm {
            username: "admin@example.com".to_string(),
            password: "nope-nope".to_string(),
        });
        assert!(form.submit(&mut ctx, &transport).is_err());
        assert_eq!(form.error("password"), Some("Incorrect email or password"));
        assert!(!ctx.is_logged_in());
    }

    #[test]
    fn sign_up_rules() {
        let errors = SignUpForm {
            full_name: "Al".to_string(),
            email: "al@example".to_string(),
            password: "12345678".to_string(),
            confirm_password: "12345679".to_string(),
        }
        .validate();
        assert_eq!(errors["full_name"], "Full Name must be at least 3 characters");
        assert_eq!(errors["email"], "Invalid email address");
        assert!(!errors.contains_key("password"));
        assert_eq!(errors["confirm_password"], "The passwords do not match");
    }

    #[test]
    fn sign_up_redirects_to_login() {
        let mut ctx = guest();
        ctx.open("/signup");
        let transport = Recorder::replying(
            200,
            r#"{"id":"00000000-0000-0000-0000-000000000003","email":"new@example.com","full_name":"Newcomer","is_active":true,"is_superuser":false}"#,
        );
        let mut form = Form::new(SignUpForm {
            full_name: "Newcomer".to_string(),
            email: "new@example.com".to_string(),
            password: "long-enough".to_string(),
            confirm_password: "long-enough".to_string(),
        });
        form.submit(&mut ctx, &transport).unwrap();
        assert_eq!(ctx.navigator.route(), Some(&Route::Login));
        assert!(!ctx.is_logged_in());
    }
}
