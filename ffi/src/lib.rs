//! C-ABI wrapper around `admin-core`.
//!
//! # Overview
//! Exposes the admin API's request building and response parsing through
//! `extern "C"` functions, plus the pure helpers a native shell needs to
//! drive the tables (page arithmetic) and the theme. Any language with a C
//! FFI can use it without linking to serde or an async runtime.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` functions mirror the core API; parse functions
//!   are per payload type, since endpoints returning the same type parse
//!   identically.
//! - A single `FfiAdminResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `admin_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use admin_core::http::HttpResponse;
use admin_core::pagination::{total_pages, PageRequest};
use admin_core::theme::{ColorScheme, ThemePreference};
use admin_core::types::{ItemCreate, ItemUpdate, LoginForm};
use admin_core::{ApiClient, ApiError};
use uuid::Uuid;

use types::*;

/// Borrow a C string as UTF-8. Null or invalid UTF-8 yields `None`.
fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

fn read_uuid(s: *const c_char) -> Option<Uuid> {
    read_str(s).and_then(|s| Uuid::parse_str(s).ok())
}

/// Run `build` against the client, or return null on a null client, a
/// failed build or a panic.
fn build_with<F>(client: *const FfiAdminClient, build: F) -> *mut FfiHttpRequest
where
    F: FnOnce(&ApiClient) -> Option<admin_core::HttpRequest> + std::panic::UnwindSafe,
{
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match build(&client.inner) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `ApiClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `admin_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn admin_client_new(base_url: *const c_char) -> *mut FfiAdminClient {
    catch_unwind(|| match read_str(base_url) {
        Some(url) => Box::into_raw(Box::new(FfiAdminClient {
            inner: ApiClient::new(url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free an `ApiClient` created by `admin_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn admin_client_free(client: *mut FfiAdminClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Set the bearer token sent with every subsequent request. Null clears it.
#[unsafe(no_mangle)]
pub extern "C" fn admin_client_set_token(client: *mut FfiAdminClient, token: *const c_char) {
    if client.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let client = unsafe { &mut *client };
        client.inner.set_token(read_str(token).map(str::to_string));
    });
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the form-encoded password login.
///
/// Returns null if any argument is null.
/// The caller must free the returned pointer with `admin_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn admin_build_login(
    client: *const FfiAdminClient,
    username: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let form = LoginForm {
            username: read_str(username)?.to_string(),
            password: read_str(password)?.to_string(),
        };
        Some(c.build_login_access_token(&form))
    })
}

/// Build a request for the signed-in user.
#[unsafe(no_mangle)]
pub extern "C" fn admin_build_read_user_me(client: *const FfiAdminClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_read_user_me()))
}

/// Build a request for one page of users. `page` is 1-based.
#[unsafe(no_mangle)]
pub extern "C" fn admin_build_read_users(
    client: *const FfiAdminClient,
    page: u32,
    size: u32,
) -> *mut FfiHttpRequest {
    let request = PageRequest::new(page, size);
    build_with(client, |c| Some(c.build_read_users(request.skip(), request.limit())))
}

/// Build a request deleting the user with `id`.
///
/// Returns null if `id` is null or not a valid UUID.
#[unsafe(no_mangle)]
pub extern "C" fn admin_build_delete_user(
    client: *const FfiAdminClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_delete_user(read_uuid(id)?)))
}

/// Build a request for one page of items. `page` is 1-based.
#[unsafe(no_mangle)]
pub extern "C" fn admin_build_read_items(
    client: *const FfiAdminClient,
    page: u32,
    size: u32,
) -> *mut FfiHttpRequest {
    let request = PageRequest::new(page, size);
    build_with(client, |c| Some(c.build_read_items(request.skip(), request.limit())))
}

#[unsafe(no_mangle)]
pub extern "C" fn admin_build_read_item(
    client: *const FfiAdminClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_read_item(read_uuid(id)?)))
}

/// Build a request creating an item.
///
/// `description` may be null (omitted). An empty description is sent as-is.
/// Returns null if `title` is null.
#[unsafe(no_mangle)]
pub extern "C" fn admin_build_create_item(
    client: *const FfiAdminClient,
    title: *const c_char,
    description: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let input = ItemCreate {
            title: read_str(title)?.to_string(),
            description: read_str(description).map(str::to_string),
        };
        c.build_create_item(&input).ok()
    })
}

/// Build a request updating an item. Null `title` or `description` leaves
/// that field unchanged.
#[unsafe(no_mangle)]
pub extern "C" fn admin_build_update_item(
    client: *const FfiAdminClient,
    id: *const c_char,
    title: *const c_char,
    description: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let input = ItemUpdate {
            title: read_str(title).map(str::to_string),
            description: read_str(description).map(str::to_string),
        };
        c.build_update_item(read_uuid(id)?, &input).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn admin_build_delete_item(
    client: *const FfiAdminClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_delete_item(read_uuid(id)?)))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is an
/// empty body.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = read_str(resp.body).unwrap_or("");
    let response = HttpResponse::new(resp.status, body);
    match read_str(resp.content_type) {
        Some(ct) => response.with_header("content-type", ct),
        None => response,
    }
}

/// Shared shape of every `admin_parse_*`: null checks, conversion, panic
/// guard, and either the success payload or the error envelope.
fn parse_with<T, P, W>(
    name: &str,
    client: *const FfiAdminClient,
    response: *const FfiHttpResponse,
    parse: P,
    wrap: W,
) -> *mut FfiAdminResult
where
    P: FnOnce(&ApiClient, HttpResponse) -> Result<T, ApiError> + std::panic::UnwindSafe,
    W: FnOnce(T) -> *mut FfiAdminResult + std::panic::UnwindSafe,
{
    catch_unwind(|| {
        if client.is_null() {
            return FfiAdminResult::null_arg("client");
        }
        if response.is_null() {
            return FfiAdminResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = ffi_response_to_core(unsafe { &*response });
        match parse(&client.inner, resp) {
            Ok(value) => wrap(value),
            Err(e) => FfiAdminResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiAdminResult::panic(&format!("panic in {name}")))
}

/// Parse a login response. `data_tag = Token` on success.
#[unsafe(no_mangle)]
pub extern "C" fn admin_parse_token(
    client: *const FfiAdminClient,
    response: *const FfiHttpResponse,
) -> *mut FfiAdminResult {
    parse_with(
        "admin_parse_token",
        client,
        response,
        |c, r| c.parse_login_access_token(r),
        FfiAdminResult::ok_token,
    )
}

/// Parse a single-user response. `data_tag = User` on success.
#[unsafe(no_mangle)]
pub extern "C" fn admin_parse_user(
    client: *const FfiAdminClient,
    response: *const FfiHttpResponse,
) -> *mut FfiAdminResult {
    parse_with(
        "admin_parse_user",
        client,
        response,
        |c, r| c.parse_read_user_me(r),
        FfiAdminResult::ok_user,
    )
}

/// Parse a users page. `data_tag = UserPage` on success.
#[unsafe(no_mangle)]
pub extern "C" fn admin_parse_users(
    client: *const FfiAdminClient,
    response: *const FfiHttpResponse,
) -> *mut FfiAdminResult {
    parse_with(
        "admin_parse_users",
        client,
        response,
        |c, r| c.parse_read_users(r),
        FfiAdminResult::ok_user_page,
    )
}

/// Parse a single-item response (read, create or update). `data_tag = Item`
/// on success.
#[unsafe(no_mangle)]
pub extern "C" fn admin_parse_item(
    client: *const FfiAdminClient,
    response: *const FfiHttpResponse,
) -> *mut FfiAdminResult {
    parse_with(
        "admin_parse_item",
        client,
        response,
        |c, r| c.parse_read_item(r),
        FfiAdminResult::ok_item,
    )
}

/// Parse an items page. `data_tag = ItemPage` on success.
#[unsafe(no_mangle)]
pub extern "C" fn admin_parse_items(
    client: *const FfiAdminClient,
    response: *const FfiHttpResponse,
) -> *mut FfiAdminResult {
    parse_with(
        "admin_parse_items",
        client,
        response,
        |c, r| c.parse_read_items(r),
        FfiAdminResult::ok_item_page,
    )
}

/// Parse a confirmation body such as a delete's. `data_tag = Message` and
/// `data` is a `char*` on success.
#[unsafe(no_mangle)]
pub extern "C" fn admin_parse_message(
    client: *const FfiAdminClient,
    response: *const FfiHttpResponse,
) -> *mut FfiAdminResult {
    parse_with(
        "admin_parse_message",
        client,
        response,
        |c, r| c.parse_delete_item(r),
        FfiAdminResult::ok_message,
    )
}

// ---------------------------------------------------------------------------
// Pagination and theme helpers
// ---------------------------------------------------------------------------

/// Rows to skip for 1-based `page` at `size` per page. Page 0 counts as 1.
#[unsafe(no_mangle)]
pub extern "C" fn admin_page_skip(page: u32, size: u32) -> u64 {
    PageRequest::new(page, size).skip()
}

/// Number of pages for `count` rows at `size` per page; never below 1.
#[unsafe(no_mangle)]
pub extern "C" fn admin_total_pages(count: u64, size: u32) -> u64 {
    total_pages(count, size)
}

/// Whether a page that came back with `received` rows should trigger a
/// prefetch of the next page.
#[unsafe(no_mangle)]
pub extern "C" fn admin_should_prefetch_next(page: u32, size: u32, received: u32) -> bool {
    PageRequest::new(page, size).should_prefetch_next(received as usize)
}

/// Resolve a stored preference ("light", "dark" or "system") against the
/// platform scheme. Null or unknown preferences count as "system".
#[unsafe(no_mangle)]
pub extern "C" fn admin_resolve_theme(preference: *const c_char, system_dark: bool) -> FfiTheme {
    catch_unwind(|| {
        let preference = read_str(preference)
            .and_then(|p| p.parse::<ThemePreference>().ok())
            .unwrap_or_default();
        let system = if system_dark { ColorScheme::Dark } else { ColorScheme::Light };
        preference.resolve(system).into()
    })
    .unwrap_or(FfiTheme::Light)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `admin_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn admin_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.path);
        free_c_string(req.body);
        for h in unsafe { from_raw_array(req.headers, req.headers_len) } {
            free_c_string(h.key);
            free_c_string(h.value);
        }
    });
}

/// Free an `FfiAdminResult` returned by any `admin_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn admin_free_result(result: *mut FfiAdminResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.field_errors);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Token => {
                let token = unsafe { Box::from_raw(result.data as *mut FfiToken) };
                free_c_string(token.access_token);
                free_c_string(token.token_type);
            }
            FfiDataTag::User => {
                let user = unsafe { Box::from_raw(result.data as *mut FfiUser) };
                user.free_fields();
            }
            FfiDataTag::UserPage => {
                let page = unsafe { Box::from_raw(result.data as *mut FfiUserPage) };
                for user in unsafe { from_raw_array(page.data, page.len) } {
                    user.free_fields();
                }
            }
            FfiDataTag::Item => {
                let item = unsafe { Box::from_raw(result.data as *mut FfiItem) };
                item.free_fields();
            }
            FfiDataTag::ItemPage => {
                let page = unsafe { Box::from_raw(result.data as *mut FfiItemPage) };
                for item in unsafe { from_raw_array(page.data, page.len) } {
                    item.free_fields();
                }
            }
            FfiDataTag::Message => free_c_string(result.data as *mut c_char),
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn admin_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
