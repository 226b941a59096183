//! Auth session: who is signed in, and what happens when that changes.
//!
//! # Design
//! Two deployments exist. In `Token` mode the client logs in against the
//! API and keeps a bearer token in storage. In `Proxy` mode an
//! authenticating reverse proxy owns the session; the client only asks it
//! who the user is and sends the browser to its sign-out endpoint.
//!
//! Only an authentication failure ends the session. A network error or a
//! 5xx while loading the current user leaves the token in place and puts
//! the session in `Unavailable`, so a flaky connection does not log anyone
//! out.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppContext;
use crate::cache::QueryKey;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::routes::Route;
use crate::storage::Storage;
use crate::transport::Transport;
use crate::types::{Token, UserPublic};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Token,
    Proxy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Authenticated(UserPublic),
    Anonymous,
    /// The current user could not be loaded for a reason other than
    /// authentication.
    Unavailable(String),
}

#[derive(Debug)]
pub struct AuthSession {
    mode: AuthMode,
    state: SessionState,
}

impl AuthSession {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            state: SessionState::Loading,
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&UserPublic> {
        match &self.state {
            SessionState::Authenticated(u) => Some(u),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    /// Request that loads the current user for this mode.
    pub fn build_current_user(&self, client: &ApiClient) -> HttpRequest {
        match self.mode {
            AuthMode::Token => client.build_read_user_me(),
            AuthMode::Proxy => client.build_read_user_info(),
        }
    }

    pub fn parse_current_user(
        &self,
        client: &ApiClient,
        response: crate::http::HttpResponse,
    ) -> Result<UserPublic, ApiError> {
        match self.mode {
            AuthMode::Token => client.parse_read_user_me(response),
            AuthMode::Proxy => client.parse_read_user_info(response),
        }
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }
}

impl<S: Storage> AppContext<S> {
    /// Token mode: a token is stored. Proxy mode: the proxy has vouched for
    /// a user.
    pub fn is_logged_in(&self) -> bool {
        match self.session.mode() {
            AuthMode::Token => self.storage.get(&self.config.token_storage_key).is_some(),
            AuthMode::Proxy => self.session.user().is_some(),
        }
    }

    /// Load (or reuse the cached) current user and update the session.
    pub fn load_current_user(&mut self, transport: &dyn Transport) -> Option<UserPublic> {
        let key = QueryKey::current_user();
        let session = &self.session;
        let client = &self.client;
        let result = self.cache.fetch_with(&key, || {
            client.call(
                transport,
                |c| Ok(session.build_current_user(c)),
                |c, resp| session.parse_current_user(c, resp),
            )
        });
        self.apply_current_user(result)
    }

    /// Feed the outcome of a current-user request into the session. Hosts
    /// that execute `AuthSession::build_current_user` themselves call this.
    pub fn apply_current_user(
        &mut self,
        result: Result<UserPublic, ApiError>,
    ) -> Option<UserPublic> {
        match result {
            Ok(user) => {
                if let Err(e) = self.cache.set(QueryKey::current_user(), &user) {
                    warn!(error = %e, "current user not cached");
                }
                self.session.set_state(SessionState::Authenticated(user.clone()));
                Some(user)
            }
            Err(e) if e.is_auth_failure() => {
                info!("session rejected by server");
                self.logout();
                None
            }
            Err(e) => {
                warn!(error = %e, "current user unavailable");
                self.session.set_state(SessionState::Unavailable(e.message()));
                None
            }
        }
    }

    /// Store a freshly issued token and head to the dashboard. The current
    /// user is loaded by the next `load_current_user`.
    pub fn complete_login(&mut self, token: &Token) {
        self.storage.set(&self.config.token_storage_key, &token.access_token);
        self.client.set_token(Some(token.access_token.clone()));
        self.cache.clear();
        self.session.set_state(SessionState::Loading);
        info!("logged in");
        self.navigator.navigate(Route::Home);
    }

    /// Drop every trace of the session and leave: to the login page in
    /// token mode, to the proxy's sign-out endpoint in proxy mode.
    pub fn logout(&mut self) {
        self.storage.remove(&self.config.token_storage_key);
        self.client.set_token(None);
        self.cache.clear();
        self.session.set_state(SessionState::Anonymous);
        info!("logged out");
        match self.session.mode() {
            AuthMode::Token => self.navigator.navigate(Route::Login),
            AuthMode::Proxy => {
                let url = self.client.sign_out_url();
                self.navigator.redirect_external(url);
            }
        }
    }

    /// Common reaction to a failed request outside of forms.
    pub fn report_error(&mut self, err: &ApiError) {
        if err.is_auth_failure() {
            self.logout();
        } else {
            self.toasts.api_error(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::HttpResponse;
    use crate::routes::Location;
    use crate::storage::MemoryStorage;
    use crate::transport::TransportError;
    use std::cell::RefCell;

    struct Scripted(RefCell<Vec<Result<HttpResponse, TransportError>>>);

    impl Transport for Scripted {
        fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.0.borrow_mut().remove(0)
        }
    }

    const ME: &str = r#"{"id":"00000000-0000-0000-0000-000000000001","email":"me@example.com","full_name":"Me","is_active":true,"is_superuser":false}"#;

    fn ctx(mode: AuthMode) -> AppContext<MemoryStorage> {
        let config = ClientConfig {
            auth_mode: mode,
            ..ClientConfig::default()
        };
        let mut storage = MemoryStorage::new();
        storage.set(&config.token_storage_key, "tok");
        AppContext::new(config, storage)
    }

    #[test]
    fn loads_and_caches_current_user() {
        let mut ctx = ctx(AuthMode::Token);
        let transport = Scripted(RefCell::new(vec![Ok(HttpResponse::new(200, ME))]));
        let user = ctx.load_current_user(&transport).unwrap();
        assert_eq!(user.email, "me@example.com");
        assert_eq!(ctx.session.user(), Some(&user));

        // Second load is served from the cache; the script is empty now.
        assert!(ctx.load_current_user(&transport).is_some());
    }

    #[test]
    fn unauthorized_logs_out_to_login() {
        let mut ctx = ctx(AuthMode::Token);
        let transport = Scripted(RefCell::new(vec![Ok(HttpResponse::new(
            401,
            r#"{"detail":"Could not validate credentials"}"#,
        ))]));
        assert!(ctx.load_current_user(&transport).is_none());
        assert_eq!(ctx.session.state(), &SessionState::Anonymous);
        assert!(!ctx.is_logged_in());
        assert_eq!(ctx.navigator.route(), Some(&Route::Login));
    }

    #[test]
    fn transport_failure_keeps_the_session() {
        let mut ctx = ctx(AuthMode::Token);
        let refused = TransportError("connection refused".to_string());
        let transport = Scripted(RefCell::new(vec![Err(refused)]));
        assert!(ctx.load_current_user(&transport).is_none());
        assert!(matches!(ctx.session.state(), SessionState::Unavailable(_)));
        assert!(ctx.is_logged_in(), "token must survive a network error");
        assert_eq!(ctx.navigator.route(), Some(&Route::Home));
    }

    #[test]
    fn proxy_html_redirects_to_sign_out() {
        let mut ctx = ctx(AuthMode::Proxy);
        let transport = Scripted(RefCell::new(vec![Ok(
            HttpResponse::new(200, "<html></html>").with_header("content-type", "text/html")
        )]));
        assert!(ctx.load_current_user(&transport).is_none());
        assert_eq!(
            ctx.navigator.current(),
            &Location::External("http://localhost:8000/oauth2/sign_out".to_string())
        );
    }

    #[test]
    fn complete_login_stores_token() {
        let mut ctx = AppContext::new(ClientConfig::default(), MemoryStorage::new());
        ctx.complete_login(&Token {
            access_token: "fresh".to_string(),
            token_type: "bearer".to_string(),
        });
        assert!(ctx.is_logged_in());
        assert_eq!(ctx.client.token(), Some("fresh"));
        assert!(ctx.session.is_loading());
    }
}
