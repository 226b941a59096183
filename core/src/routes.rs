//! Application routes, their URL form, and navigation state.

use tracing::info;

use crate::pagination::{page_from_query, with_page_in_query};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Items { page: u32 },
    Admin { page: u32 },
    Settings,
    Login,
    SignUp,
}

impl Route {
    /// Parse a location such as `/admin?page=2`. Unknown paths map to `Home`.
    pub fn parse(location: &str) -> Self {
        let (path, query) = location.split_once('?').unwrap_or((location, ""));
        match path.trim_end_matches('/') {
            "/items" => Route::Items {
                page: page_from_query(query),
            },
            "/admin" => Route::Admin {
                page: page_from_query(query),
            },
            "/settings" => Route::Settings,
            "/login" => Route::Login,
            "/signup" => Route::SignUp,
            _ => Route::Home,
        }
    }

    pub fn href(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Items { page } => format!("/items?{}", with_page_in_query("", *page)),
            Route::Admin { page } => format!("/admin?{}", with_page_in_query("", *page)),
            Route::Settings => "/settings".to_string(),
            Route::Login => "/login".to_string(),
            Route::SignUp => "/signup".to_string(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login | Route::SignUp)
    }

    /// Routes a signed-in user is bounced away from.
    pub fn is_guest_only(&self) -> bool {
        matches!(self, Route::Login | Route::SignUp)
    }
}

/// Where the application should go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Internal(Route),
    /// A full-page navigation outside the application, e.g. the proxy's
    /// sign-out endpoint.
    External(String),
}

#[derive(Debug)]
pub struct Navigator {
    current: Location,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            current: Location::Internal(Route::Home),
        }
    }
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: Location::Internal(start),
        }
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    pub fn route(&self) -> Option<&Route> {
        match &self.current {
            Location::Internal(r) => Some(r),
            Location::External(_) => None,
        }
    }

    pub fn navigate(&mut self, route: Route) {
        info!(to = %route.href(), "navigate");
        self.current = Location::Internal(route);
    }

    pub fn redirect_external(&mut self, url: String) {
        info!(to = %url, "external redirect");
        self.current = Location::External(url);
    }

    /// Keep the page number of a table route in sync with the URL.
    pub fn set_page(&mut self, page: u32) {
        if let Location::Internal(Route::Items { page: p } | Route::Admin { page: p }) =
            &mut self.current
        {
            *p = page;
        }
    }
}

/// Redirect decision before entering `route`.
pub fn guard(route: &Route, logged_in: bool) -> Option<Route> {
    if route.requires_auth() && !logged_in {
        return Some(Route::Login);
    }
    if route.is_guest_only() && logged_in {
        return Some(Route::Home);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_table_routes_with_page() {
        assert_eq!(Route::parse("/admin?page=3"), Route::Admin { page: 3 });
        assert_eq!(Route::parse("/items"), Route::Items { page: 1 });
        assert_eq!(Route::parse("/items/?page=x"), Route::Items { page: 1 });
        assert_eq!(Route::parse("/nowhere"), Route::Home);
    }

    #[test]
    fn href_round_trips() {
        for route in [
            Route::Home,
            Route::Items { page: 2 },
            Route::Admin { page: 7 },
            Route::Settings,
            Route::Login,
            Route::SignUp,
        ] {
            assert_eq!(Route::parse(&route.href()), route);
        }
    }

    #[test]
    fn guards_redirect_both_ways() {
        assert_eq!(guard(&Route::Settings, false), Some(Route::Login));
        assert_eq!(guard(&Route::Login, true), Some(Route::Home));
        assert_eq!(guard(&Route::Login, false), None);
        assert_eq!(guard(&Route::Items { page: 1 }, true), None);
    }

    #[test]
    fn set_page_updates_table_route_only() {
        let mut nav = Navigator::new(Route::Items { page: 1 });
        nav.set_page(4);
        assert_eq!(nav.route(), Some(&Route::Items { page: 4 }));

        let mut nav = Navigator::new(Route::Settings);
        nav.set_page(4);
        assert_eq!(nav.route(), Some(&Route::Settings));
    }
}
