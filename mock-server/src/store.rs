//! In-memory users, items and sessions. Rules that the real backend
//! enforces (uniqueness, ownership, superuser-only paths) live here so the
//! handlers stay thin.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, FieldError};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_TEXT_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPublic {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRegister {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdateMe {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePassword {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemCreate {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
struct UserRecord {
    public: UserPublic,
    password: String,
}

#[derive(Debug, Default)]
pub struct Store {
    users: Vec<UserRecord>,
    items: Vec<ItemPublic>,
    /// Bearer token to user id.
    sessions: HashMap<String, Uuid>,
}

fn default_true() -> bool {
    true
}

fn check_email(field: &str, email: &str, errors: &mut Vec<FieldError>) {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.ends_with('.')
        });
    if !valid {
        errors.push(FieldError::body(
            field,
            "value is not a valid email address: An email address must have an @-sign.",
            "value_error",
        ));
    }
}

fn check_password(field: &str, password: &str, errors: &mut Vec<FieldError>) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::body(
            field,
            format!("String should have at least {MIN_PASSWORD_LEN} characters"),
            "string_too_short",
        ));
    }
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    let len = title.chars().count();
    if len == 0 {
        errors.push(FieldError::body(
            "title",
            "String should have at least 1 character",
            "string_too_short",
        ));
    } else if len > MAX_TEXT_LEN {
        errors.push(FieldError::body(
            "title",
            format!("String should have at most {MAX_TEXT_LEN} characters"),
            "string_too_long",
        ));
    }
}

fn check_description(description: Option<&str>, errors: &mut Vec<FieldError>) {
    if description.is_some_and(|d| d.chars().count() > MAX_TEXT_LEN) {
        errors.push(FieldError::body(
            "description",
            format!("String should have at most {MAX_TEXT_LEN} characters"),
            "string_too_long",
        ));
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn page<T: Clone>(rows: Vec<T>, skip: usize, limit: usize) -> Page<T> {
    let count = rows.len();
    Page {
        data: rows.into_iter().skip(skip).take(limit).collect(),
        count,
    }
}

impl Store {
    pub fn seeded(email: &str, password: &str) -> Self {
        let mut store = Store::default();
        store.users.push(UserRecord {
            public: UserPublic {
                id: Uuid::new_v4(),
                email: email.to_string(),
                full_name: None,
                is_active: true,
                is_superuser: true,
            },
            password: password.to_string(),
        });
        store
    }

    fn user(&self, id: Uuid) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.public.id == id)
    }

    fn user_mut(&mut self, id: Uuid) -> Option<&mut UserRecord> {
        self.users.iter_mut().find(|u| u.public.id == id)
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.public.email.eq_ignore_ascii_case(email) && Some(u.public.id) != except)
    }

    // --- sessions ---

    pub fn login(&mut self, email: &str, password: &str) -> Result<String, ApiError> {
        let user = self
            .users
            .iter()
            .find(|u| u.public.email.eq_ignore_ascii_case(email) && u.password == password)
            .ok_or_else(|| ApiError::BadRequest("Incorrect email or password".to_string()))?;
        if !user.public.is_active {
            return Err(ApiError::BadRequest("Inactive user".to_string()));
        }
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), user.public.id);
        info!(email = %user.public.email, "login");
        Ok(token)
    }

    /// The user a bearer token belongs to.
    pub fn authenticate(&self, token: &str) -> Result<UserPublic, ApiError> {
        let id = self.sessions.get(token).ok_or(ApiError::Unauthorized)?;
        let user = self.user(*id).ok_or(ApiError::Unauthorized)?;
        if !user.public.is_active {
            return Err(ApiError::BadRequest("Inactive user".to_string()));
        }
        Ok(user.public.clone())
    }

    pub fn sign_out(&mut self, token: &str) {
        self.sessions.remove(token);
    }

    // --- users ---

    pub fn list_users(&self, skip: usize, limit: usize) -> Page<UserPublic> {
        page(self.users.iter().map(|u| u.public.clone()).collect(), skip, limit)
    }

    pub fn create_user(&mut self, input: UserCreate) -> Result<UserPublic, ApiError> {
        let mut errors = Vec::new();
        check_email("email", &input.email, &mut errors);
        check_password("password", &input.password, &mut errors);
        finish(errors)?;
        if self.email_taken(&input.email, None) {
            return Err(ApiError::BadRequest(
                "The user with this email already exists in the system.".to_string(),
            ));
        }
        let public = UserPublic {
            id: Uuid::new_v4(),
            email: input.email,
            full_name: input.full_name,
            is_active: input.is_active,
            is_superuser: input.is_superuser,
        };
        self.users.push(UserRecord {
            public: public.clone(),
            password: input.password,
        });
        info!(id = %public.id, "user created");
        Ok(public)
    }

    pub fn register(&mut self, input: UserRegister) -> Result<UserPublic, ApiError> {
        self.create_user(UserCreate {
            email: input.email,
            password: input.password,
            full_name: input.full_name,
            is_active: true,
            is_superuser: false,
        })
    }

    pub fn read_user(&self, current: &UserPublic, id: Uuid) -> Result<UserPublic, ApiError> {
        if current.id == id {
            return Ok(current.clone());
        }
        if !current.is_superuser {
            return Err(ApiError::not_enough_privileges());
        }
        self.user(id)
            .map(|u| u.public.clone())
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub fn update_user(&mut self, id: Uuid, input: UserUpdate) -> Result<UserPublic, ApiError> {
        let mut errors = Vec::new();
        if let Some(email) = &input.email {
            check_email("email", email, &mut errors);
        }
        if let Some(password) = &input.password {
            check_password("password", password, &mut errors);
        }
        finish(errors)?;
        if self.user(id).is_none() {
            return Err(ApiError::NotFound(
                "The user with this id does not exist in the system".to_string(),
            ));
        }
        if input.email.as_deref().is_some_and(|e| self.email_taken(e, Some(id))) {
            return Err(ApiError::Conflict("User with this email already exists".to_string()));
        }
        let record = self
            .user_mut(id)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        if let Some(email) = input.email {
            record.public.email = email;
        }
        if let Some(password) = input.password {
            record.password = password;
        }
        if let Some(full_name) = input.full_name {
            record.public.full_name = Some(full_name);
        }
        if let Some(is_active) = input.is_active {
            record.public.is_active = is_active;
        }
        if let Some(is_superuser) = input.is_superuser {
            record.public.is_superuser = is_superuser;
        }
        info!(%id, "user updated");
        Ok(record.public.clone())
    }

    pub fn update_me(
        &mut self,
        current: &UserPublic,
        input: UserUpdateMe,
    ) -> Result<UserPublic, ApiError> {
        self.update_user(
            current.id,
            UserUpdate {
                email: input.email,
                full_name: input.full_name,
                ..UserUpdate::default()
            },
        )
    }

    pub fn update_password(
        &mut self,
        current: &UserPublic,
        input: UpdatePassword,
    ) -> Result<(), ApiError> {
        let record = self
            .user_mut(current.id)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        if record.password != input.current_password {
            return Err(ApiError::field("current_password", "Incorrect password", "value_error"));
        }
        if input.current_password == input.new_password {
            return Err(ApiError::BadRequest(
                "New password cannot be the same as the current one".to_string(),
            ));
        }
        let mut errors = Vec::new();
        check_password("new_password", &input.new_password, &mut errors);
        finish(errors)?;
        record.password = input.new_password;
        info!(id = %current.id, "password changed");
        Ok(())
    }

    /// Delete a user together with the items they own.
    pub fn delete_user(&mut self, id: Uuid) -> Result<(), ApiError> {
        let before = self.users.len();
        self.users.retain(|u| u.public.id != id);
        if self.users.len() == before {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        self.items.retain(|i| i.owner_id != id);
        self.sessions.retain(|_, user| *user != id);
        info!(%id, "user deleted");
        Ok(())
    }

    // --- items ---

    pub fn list_items(&self, current: &UserPublic, skip: usize, limit: usize) -> Page<ItemPublic> {
        let visible = self
            .items
            .iter()
            .filter(|i| current.is_superuser || i.owner_id == current.id)
            .cloned()
            .collect();
        page(visible, skip, limit)
    }

    pub fn create_item(
        &mut self,
        current: &UserPublic,
        input: ItemCreate,
    ) -> Result<ItemPublic, ApiError> {
        let mut errors = Vec::new();
        check_title(&input.title, &mut errors);
        check_description(input.description.as_deref(), &mut errors);
        finish(errors)?;
        let item = ItemPublic {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            owner_id: current.id,
        };
        self.items.push(item.clone());
        info!(id = %item.id, "item created");
        Ok(item)
    }

    fn owned_item(&mut self, current: &UserPublic, id: Uuid) -> Result<&mut ItemPublic, ApiError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;
        if !current.is_superuser && item.owner_id != current.id {
            return Err(ApiError::BadRequest("Not enough permissions".to_string()));
        }
        Ok(item)
    }

    pub fn read_item(&mut self, current: &UserPublic, id: Uuid) -> Result<ItemPublic, ApiError> {
        self.owned_item(current, id).map(|i| i.clone())
    }

    pub fn update_item(
        &mut self,
        current: &UserPublic,
        id: Uuid,
        input: ItemUpdate,
    ) -> Result<ItemPublic, ApiError> {
        let mut errors = Vec::new();
        if let Some(title) = &input.title {
            check_title(title, &mut errors);
        }
        check_description(input.description.as_deref(), &mut errors);
        finish(errors)?;
        let item = self.owned_item(current, id)?;
        if let Some(title) = input.title {
            item.title = title;
        }
        if let Some(description) = input.description {
            item.description = Some(description);
        }
        info!(%id, "item updated");
        Ok(item.clone())
    }

    pub fn delete_item(&mut self, current: &UserPublic, id: Uuid) -> Result<(), ApiError> {
        self.owned_item(current, id)?;
        self.items.retain(|i| i.id != id);
        info!(%id, "item deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store::seeded("admin@example.com", "changethis")
    }

    fn admin(store: &mut Store) -> UserPublic {
        let token = store.login("admin@example.com", "changethis").unwrap();
        store.authenticate(&token).unwrap()
    }

    fn user_input(email: &str) -> UserCreate {
        UserCreate {
            email: email.to_string(),
            password: "password123".to_string(),
            full_name: None,
            is_active: true,
            is_superuser: false,
        }
    }

    #[test]
    fn login_rejects_wrong_password() {
        let mut store = store();
        let err = store.login("admin@example.com", "nope").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == "Incorrect email or password"));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let mut store = store();
        store.create_user(user_input("a@example.com")).unwrap();
        assert!(matches!(
            store.create_user(user_input("A@example.com")),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn paging_reports_total_count() {
        let mut store = store();
        for n in 0..6 {
            store.create_user(user_input(&format!("u{n}@example.com"))).unwrap();
        }
        let page = store.list_users(5, 5);
        assert_eq!(page.count, 7);
        assert_eq!(page.data.len(), 2);
    }

    #[test]
    fn wrong_current_password_is_a_field_error() {
        let mut store = store();
        let me = admin(&mut store);
        let err = store
            .update_password(
                &me,
                UpdatePassword {
                    current_password: "wrong-one".to_string(),
                    new_password: "new-password".to_string(),
                },
            )
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => assert_eq!(errors[0].loc, ["body", "current_password"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn deleting_a_user_removes_their_items_and_sessions() {
        let mut store = store();
        store.create_user(user_input("owner@example.com")).unwrap();
        let token = store.login("owner@example.com", "password123").unwrap();
        let owner = store.authenticate(&token).unwrap();
        store
            .create_item(
                &owner,
                ItemCreate {
                    title: "mine".to_string(),
                    description: None,
                },
            )
            .unwrap();

        store.delete_user(owner.id).unwrap();
        let me = admin(&mut store);
        assert_eq!(store.list_items(&me, 0, 10).count, 0);
        assert!(matches!(store.authenticate(&token), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn items_are_private_to_their_owner() {
        let mut store = store();
        let me = admin(&mut store);
        let item = store
            .create_item(
                &me,
                ItemCreate {
                    title: "secret".to_string(),
                    description: Some(String::new()),
                },
            )
            .unwrap();
        let other = store.create_user(user_input("other@example.com")).unwrap();
        assert_eq!(store.list_items(&other, 0, 10).count, 0);
        assert!(matches!(store.read_item(&other, item.id), Err(ApiError::BadRequest(_))));
    }
}
