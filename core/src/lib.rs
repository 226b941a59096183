//! Client core for the admin dashboard: typed REST client, query cache,
//! paginated tables, mutation forms, auth session and theme.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). Hosts either execute
//! requests themselves and feed the responses back (`begin_*`/`finish_*`),
//! or hand in a blocking `Transport` and let the stateful layers drive the
//! round-trip.
//!
//! # Design
//! - `ApiClient` is stateless apart from its base URL and bearer token.
//!   Each endpoint is a `build_*`/`parse_*` pair in `services`.
//! - Session-wide state (cache, toasts, auth, theme, navigation) lives in
//!   one `AppContext`, created at startup and passed explicitly.
//! - DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod app;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod forms;
pub mod http;
pub mod notify;
pub mod pagination;
pub mod request;
pub mod routes;
pub mod services;
pub mod storage;
pub mod stream;
pub mod table;
pub mod theme;
pub mod transport;
pub mod types;

pub use app::AppContext;
pub use auth::{AuthMode, AuthSession, SessionState};
pub use cache::{QueryCache, QueryKey};
pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use forms::{Form, FormSpec, Modal, SubmitError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use pagination::{NextPagePolicy, PageRequest};
pub use routes::{Location, Navigator, Route};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use stream::{CancelHandle, StreamController, StreamStatus};
pub use table::{ItemsTable, PaginatedTable, UsersTable};
pub use theme::{ColorScheme, ResolvedTheme, ThemePreference, ThemeStore};
pub use transport::{Transport, TransportError};
pub use types::{ItemPublic, Message, Page, Token, UserPublic};
