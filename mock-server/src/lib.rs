//! In-memory stand-in for the admin backend, speaking the same JSON as the
//! real API. Used by the client's integration tests and for local runs.

pub mod config;
pub mod error;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, QueryRejection},
        FromRequestParts, Path, Query, State,
    },
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, patch, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub use config::MockConfig;
pub use error::{ApiError, FieldError};
pub use store::{ItemPublic, Page, Store, UserPublic};

use store::{
    ItemCreate, ItemUpdate, UpdatePassword, UserCreate, UserRegister, UserUpdate, UserUpdateMe,
};

pub type Db = Arc<RwLock<Store>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

pub fn app() -> Router {
    app_with(&MockConfig::default())
}

pub fn app_with(config: &MockConfig) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded(
        &config.first_superuser,
        &config.first_superuser_password,
    )));
    Router::new()
        .route("/api/v1/login/access-token", post(login_access_token))
        .route("/api/v1/login/test-token", post(test_token))
        .route("/api/v1/users/", get(list_users).post(create_user))
        .route("/api/v1/users/me", get(read_me).patch(update_me).delete(delete_me))
        .route("/api/v1/users/me/password", patch(update_password))
        .route("/api/v1/users/signup", post(signup))
        .route("/api/v1/users/{id}", get(read_user).patch(update_user).delete(delete_user))
        .route("/api/v1/items/", get(list_items).post(create_item))
        .route("/api/v1/items/{id}", get(read_item).put(update_item).delete(delete_item))
        .route("/oauth2/userinfo", get(userinfo))
        .route("/oauth2/sign_out", get(sign_out))
        .with_state(db)
}

pub async fn run(listener: TcpListener, config: &MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// The user behind the request's bearer token.
pub struct CurrentUser(pub UserPublic);

impl FromRequestParts<Db> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let token = bearer(&parts.headers).ok_or(ApiError::Unauthorized)?;
        db.read().await.authenticate(token).map(CurrentUser)
    }
}

/// A current user who is also a superuser.
pub struct Superuser(pub UserPublic);

impl FromRequestParts<Db> for Superuser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, db).await?;
        if !user.is_superuser {
            return Err(ApiError::not_enough_privileges());
        }
        Ok(Superuser(user))
    }
}

// --- login ---

async fn login_access_token(
    State(db): State<Db>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<Token>, ApiError> {
    let Form(form) = form?;
    let access_token = db.write().await.login(&form.username, &form.password)?;
    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

async fn test_token(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user)
}

// --- users ---

async fn list_users(
    State(db): State<Db>,
    _admin: Superuser,
    paging: Result<Query<Paging>, QueryRejection>,
) -> Result<Json<Page<UserPublic>>, ApiError> {
    let Query(paging) = paging?;
    Ok(Json(db.read().await.list_users(paging.skip, paging.limit)))
}

async fn create_user(
    State(db): State<Db>,
    _admin: Superuser,
    payload: Result<Json<UserCreate>, JsonRejection>,
) -> Result<Json<UserPublic>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(db.write().await.create_user(input)?))
}

async fn read_me(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user)
}

async fn update_me(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UserUpdateMe>, JsonRejection>,
) -> Result<Json<UserPublic>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(db.write().await.update_me(&user, input)?))
}

async fn delete_me(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Message>, ApiError> {
    if user.is_superuser {
        return Err(ApiError::Forbidden(
            "Super users are not allowed to delete themselves".to_string(),
        ));
    }
    db.write().await.delete_user(user.id)?;
    Ok(Message::new("User deleted successfully"))
}

async fn update_password(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdatePassword>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(input) = payload?;
    db.write().await.update_password(&user, input)?;
    Ok(Message::new("Password updated successfully"))
}

async fn signup(
    State(db): State<Db>,
    payload: Result<Json<UserRegister>, JsonRejection>,
) -> Result<Json<UserPublic>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(db.write().await.register(input)?))
}

async fn read_user(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserPublic>, ApiError> {
    Ok(Json(db.read().await.read_user(&user, id)?))
}

async fn update_user(
    State(db): State<Db>,
    _admin: Superuser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<UserPublic>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(db.write().await.update_user(id, input)?))
}

async fn delete_user(
    State(db): State<Db>,
    Superuser(admin): Superuser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    if admin.id == id {
        return Err(ApiError::Forbidden(
            "Super users are not allowed to delete themselves".to_string(),
        ));
    }
    db.write().await.delete_user(id)?;
    Ok(Message::new("User deleted successfully"))
}

// --- items ---

async fn list_items(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    paging: Result<Query<Paging>, QueryRejection>,
) -> Result<Json<Page<ItemPublic>>, ApiError> {
    let Query(paging) = paging?;
    Ok(Json(db.read().await.list_items(&user, paging.skip, paging.limit)))
}

async fn create_item(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ItemCreate>, JsonRejection>,
) -> Result<Json<ItemPublic>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(db.write().await.create_item(&user, input)?))
}

async fn read_item(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemPublic>, ApiError> {
    Ok(Json(db.write().await.read_item(&user, id)?))
}

async fn update_item(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<ItemUpdate>, JsonRejection>,
) -> Result<Json<ItemPublic>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(db.write().await.update_item(&user, id, input)?))
}

async fn delete_item(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    db.write().await.delete_item(&user, id)?;
    Ok(Message::new("Item deleted successfully"))
}

// --- reverse-proxy session ---

const LOGIN_PAGE: &str = "<!doctype html><html><body><a href=\"/oauth2/start\">Sign in</a></body></html>";

/// Signed-in users get JSON; everyone else gets the proxy's HTML login
/// page with a 200, the way an authenticating proxy answers.
async fn userinfo(State(db): State<Db>, headers: HeaderMap) -> Response {
    let user = match bearer(&headers) {
        Some(token) => db.read().await.authenticate(token).ok(),
        None => None,
    };
    match user {
        Some(user) => Json(user).into_response(),
        None => Html(LOGIN_PAGE).into_response(),
    }
}

async fn sign_out(State(db): State<Db>, headers: HeaderMap) -> (StatusCode, Html<&'static str>) {
    if let Some(token) = bearer(&headers) {
        db.write().await.sign_out(token);
    }
    (StatusCode::OK, Html(LOGIN_PAGE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer(&headers), None);
    }

    #[test]
    fn paging_defaults() {
        let paging: Paging = serde_json::from_str("{}").unwrap();
        assert_eq!((paging.skip, paging.limit), (0, 100));
    }

    #[test]
    fn validation_errors_serialize_like_the_backend() {
        let err = FieldError::body(
            "title",
            "String should have at least 1 character",
            "string_too_short",
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["loc"], serde_json::json!(["body", "title"]));
        assert_eq!(json["type"], "string_too_short");
    }
}
