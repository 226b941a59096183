//! Resource services: one `build_*`/`parse_*` pair per REST endpoint.
//!
//! Each module adds an `impl ApiClient` block for its resource so callers
//! see a single client type.

pub mod items;
pub mod login;
pub mod users;

pub const USERS_URL: &str = "/api/v1/users/";
pub const ITEMS_URL: &str = "/api/v1/items/";
