//! The application context: every piece of session-wide state, created once
//! at startup and passed explicitly to whatever needs it.

use tracing::info;

use crate::auth::{AuthMode, AuthSession};
use crate::cache::QueryCache;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::notify::Toaster;
use crate::pagination::page_from_query;
use crate::routes::{guard, Navigator, Route};
use crate::storage::Storage;
use crate::table::{ItemsTable, UsersTable};
use crate::theme::{ColorScheme, ResolvedTheme, RootClassList, ThemePreference, ThemeStore};

pub struct AppContext<S: Storage> {
    pub config: ClientConfig,
    pub client: ApiClient,
    pub cache: QueryCache,
    pub toasts: Toaster,
    pub session: AuthSession,
    pub theme: ThemeStore,
    pub navigator: Navigator,
    pub storage: S,
}

impl<S: Storage> AppContext<S> {
    /// Restore persisted state (bearer token, theme) from `storage`.
    pub fn new(config: ClientConfig, storage: S) -> Self {
        let mut client = ApiClient::new(&config.api_base_url);
        if config.auth_mode == AuthMode::Token {
            client.set_token(storage.get(&config.token_storage_key));
        }
        let theme = ThemeStore::load(&storage, &config.theme_storage_key, config.default_theme);
        info!(base_url = client.base_url(), mode = ?config.auth_mode, "application context ready");
        Self {
            session: AuthSession::new(config.auth_mode),
            client,
            cache: QueryCache::new(),
            toasts: Toaster::new(),
            theme,
            navigator: Navigator::default(),
            storage,
            config,
        }
    }

    /// Navigate to `location`, applying the auth guards. Returns the route
    /// actually entered.
    pub fn open(&mut self, location: &str) -> Route {
        let requested = Route::parse(location);
        let route = guard(&requested, self.is_logged_in()).unwrap_or(requested);
        self.navigator.navigate(route.clone());
        route
    }

    pub fn set_theme(&mut self, preference: ThemePreference) {
        self.theme.set(&mut self.storage, preference);
    }

    pub fn apply_theme(&self, system: ColorScheme, root: &mut RootClassList) -> ResolvedTheme {
        self.theme.apply(system, root)
    }

    /// The users table for the page in `query` (e.g. `?page=2`).
    pub fn users_table(&self, query: &str) -> UsersTable {
        UsersTable::new(
            page_from_query(query),
            self.config.users_page_size,
            self.config.next_page_policy,
        )
    }

    pub fn items_table(&self, query: &str) -> ItemsTable {
        ItemsTable::new(
            page_from_query(query),
            self.config.items_page_size,
            self.config.next_page_policy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn restores_token_and_theme() {
        let config = ClientConfig::default();
        let mut storage = MemoryStorage::new();
        storage.set(&config.token_storage_key, "tok");
        storage.set(&config.theme_storage_key, "dark");

        let ctx = AppContext::new(config, storage);
        assert_eq!(ctx.client.token(), Some("tok"));
        assert_eq!(ctx.theme.preference(), ThemePreference::Dark);
        assert!(ctx.is_logged_in());
    }

    #[test]
    fn open_applies_guards() {
        let mut ctx = AppContext::new(ClientConfig::default(), MemoryStorage::new());
        assert_eq!(ctx.open("/admin?page=2"), Route::Login);

        ctx.storage.set("access_token", "tok");
        assert_eq!(ctx.open("/signup"), Route::Home);
        assert_eq!(ctx.open("/items?page=3"), Route::Items { page: 3 });
    }

    #[test]
    fn theme_change_persists() {
        let mut ctx = AppContext::new(ClientConfig::default(), MemoryStorage::new());
        ctx.set_theme(ThemePreference::Dark);
        let storage = ctx.storage;
        let reloaded = AppContext::new(ClientConfig::default(), storage);
        assert_eq!(reloaded.theme.preference(), ThemePreference::Dark);
    }

    #[test]
    fn tables_read_page_from_query() {
        let ctx = AppContext::new(ClientConfig::default(), MemoryStorage::new());
        assert_eq!(ctx.users_table("?page=4").page(), 4);
        assert_eq!(ctx.items_table("").page_request().size, 5);
    }
}
