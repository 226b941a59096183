//! Field rules shared by the forms.

use std::sync::LazyLock;

use regex::Regex;

use super::FieldErrors;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_TEXT_LEN: usize = 255;
pub const MIN_FULL_NAME_LEN: usize = 3;

pub const INVALID_EMAIL: &str = "Invalid email address";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";
pub const PASSWORDS_DIFFER: &str = "The passwords do not match";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email pattern compiles")
});

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Collects the first failure per field.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn required(&mut self, field: &str, value: &str, message: &str) -> bool {
        if value.trim().is_empty() {
            self.fail(field, message);
            return false;
        }
        true
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if self.required(field, value, "Email is required") && !is_valid_email(value) {
            self.fail(field, INVALID_EMAIL);
        }
    }

    pub fn password(&mut self, field: &str, value: &str) {
        if self.required(field, value, "Password is required")
            && value.chars().count() < MIN_PASSWORD_LEN
        {
            self.fail(field, PASSWORD_TOO_SHORT);
        }
    }

    pub fn confirmation(&mut self, field: &str, password: &str, confirm: &str) {
        if self.required(field, confirm, "Please confirm your password") && password != confirm {
            self.fail(field, PASSWORDS_DIFFER);
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.fail(field, format!("Must be at most {max} characters"));
        }
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize, message: &str) {
        if value.trim().chars().count() < min {
            self.fail(field, message);
        }
    }

    pub fn finish(self) -> FieldErrors {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern_is_case_insensitive() {
        assert!(is_valid_email("Admin@Example.COM"));
        assert!(is_valid_email("first.last+tag@sub.example.io"));
        assert!(!is_valid_email("no-at-sign.example.com"));
        assert!(!is_valid_email("user@example.c"));
        assert!(!is_valid_email("user@@example.com"));
    }

    #[test]
    fn first_error_per_field_wins() {
        let mut v = Validator::new();
        v.password("password", "");
        v.fail("password", "later");
        assert_eq!(v.finish()["password"], "Password is required");
    }

    #[test]
    fn password_rules() {
        let mut v = Validator::new();
        v.password("password", "short");
        v.confirmation("confirm_password", "short", "shorter");
        let errors = v.finish();
        assert_eq!(errors["password"], PASSWORD_TOO_SHORT);
        assert_eq!(errors["confirm_password"], PASSWORDS_DIFFER);
    }

    #[test]
    fn length_limits_count_characters() {
        let mut v = Validator::new();
        v.max_len("title", &"é".repeat(MAX_TEXT_LEN), MAX_TEXT_LEN);
        assert!(v.finish().is_empty());
    }
}
