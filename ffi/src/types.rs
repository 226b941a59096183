//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use admin_core::error::ApiError;
use admin_core::http::HttpMethod;
use admin_core::theme::ResolvedTheme;
use admin_core::types::{ItemPublic, Message, Page, Token, UserPublic};

/// Opaque handle to an `ApiClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiAdminClient {
    pub(crate) inner: admin_core::ApiClient,
}

/// Copy `s` into a C string owned by the caller. Interior NULs are dropped.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s: String = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

fn c_string_opt(s: Option<String>) -> *mut c_char {
    s.map_or(std::ptr::null_mut(), c_string)
}

/// Free a C string produced by `c_string`. Null is ignored.
pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Leak `items` as a C array. Empty vectors become null.
fn into_raw_array<T>(items: Vec<T>) -> (*mut T, u32) {
    let len = items.len() as u32;
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let mut boxed = items.into_boxed_slice();
    let ptr = boxed.as_mut_ptr();
    std::mem::forget(boxed);
    (ptr, len)
}

/// Reclaim an array leaked by `into_raw_array`.
pub(crate) unsafe fn from_raw_array<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len as usize)) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `admin_build_*` functions. The C caller executes the request
/// and passes the response back through `admin_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: admin_core::HttpRequest) -> *mut Self {
        let headers = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_array(headers);

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body: c_string_opt(req.body),
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to an `admin_parse_*` function. The FFI layer reads
/// but does not free these fields. `content_type` may be null.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub content_type: *const c_char,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiAdminResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Unauthorized = 2,
    Forbidden = 3,
    Validation = 4,
    Http = 5,
    Deserialization = 6,
    Serialization = 7,
    Transport = 8,
    Panic = 9,
    NullArg = 10,
}

/// Tag that tells `admin_free_result` what `FfiAdminResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Token = 1,
    User = 2,
    UserPage = 3,
    Item = 4,
    ItemPage = 5,
    Message = 6,
}

#[repr(C)]
pub struct FfiToken {
    pub access_token: *mut c_char,
    pub token_type: *mut c_char,
}

/// A user exposed to C. `full_name` is null when unset.
#[repr(C)]
pub struct FfiUser {
    pub id: *mut c_char,
    pub email: *mut c_char,
    pub full_name: *mut c_char,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl FfiUser {
    fn from_core(user: UserPublic) -> Self {
        FfiUser {
            id: c_string(user.id.to_string()),
            email: c_string(user.email),
            full_name: c_string_opt(user.full_name),
            is_active: user.is_active,
            is_superuser: user.is_superuser,
        }
    }

    pub(crate) fn free_fields(&self) {
        free_c_string(self.id);
        free_c_string(self.email);
        free_c_string(self.full_name);
    }
}

/// An item exposed to C. `description` is null when unset.
#[repr(C)]
pub struct FfiItem {
    pub id: *mut c_char,
    pub title: *mut c_char,
    pub description: *mut c_char,
    pub owner_id: *mut c_char,
}

impl FfiItem {
    fn from_core(item: ItemPublic) -> Self {
        FfiItem {
            id: c_string(item.id.to_string()),
            title: c_string(item.title),
            description: c_string_opt(item.description),
            owner_id: c_string(item.owner_id.to_string()),
        }
    }

    pub(crate) fn free_fields(&self) {
        free_c_string(self.id);
        free_c_string(self.title);
        free_c_string(self.description);
        free_c_string(self.owner_id);
    }
}

/// One page of users plus the server's total count.
#[repr(C)]
pub struct FfiUserPage {
    pub data: *mut FfiUser,
    pub len: u32,
    pub count: u64,
}

#[repr(C)]
pub struct FfiItemPage {
    pub data: *mut FfiItem,
    pub len: u32,
    pub count: u64,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null. For `Validation` errors
/// `field_errors` holds a JSON object mapping field names to messages;
/// otherwise it is null.
#[repr(C)]
pub struct FfiAdminResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub field_errors: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiAdminResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiAdminResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            field_errors: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn failure(
        error_code: FfiErrorCode,
        http_status: u16,
        message: String,
        field_errors: *mut c_char,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiAdminResult {
            error_code,
            error_message: c_string(message),
            field_errors,
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_token(token: Token) -> *mut Self {
        let token = Box::new(FfiToken {
            access_token: c_string(token.access_token),
            token_type: c_string(token.token_type),
        });
        Self::ok(FfiDataTag::Token, Box::into_raw(token) as *mut c_void)
    }

    pub(crate) fn ok_user(user: UserPublic) -> *mut Self {
        let user = Box::new(FfiUser::from_core(user));
        Self::ok(FfiDataTag::User, Box::into_raw(user) as *mut c_void)
    }

    pub(crate) fn ok_user_page(page: Page<UserPublic>) -> *mut Self {
        let (data, len) = into_raw_array(page.data.into_iter().map(FfiUser::from_core).collect());
        let page = Box::new(FfiUserPage {
            data,
            len,
            count: page.count,
        });
        Self::ok(FfiDataTag::UserPage, Box::into_raw(page) as *mut c_void)
    }

    pub(crate) fn ok_item(item: ItemPublic) -> *mut Self {
        let item = Box::new(FfiItem::from_core(item));
        Self::ok(FfiDataTag::Item, Box::into_raw(item) as *mut c_void)
    }

    pub(crate) fn ok_item_page(page: Page<ItemPublic>) -> *mut Self {
        let (data, len) = into_raw_array(page.data.into_iter().map(FfiItem::from_core).collect());
        let page = Box::new(FfiItemPage {
            data,
            len,
            count: page.count,
        });
        Self::ok(FfiDataTag::ItemPage, Box::into_raw(page) as *mut c_void)
    }

    /// The message is handed over as a plain C string.
    pub(crate) fn ok_message(message: Message) -> *mut Self {
        Self::ok(FfiDataTag::Message, c_string(message.message) as *mut c_void)
    }

    /// Build an error result from an `ApiError`. The message is the one a
    /// toast would show.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (code, status) = match &err {
            ApiError::NotFound { .. } => (FfiErrorCode::NotFound, 404),
            ApiError::Unauthorized { status, .. } => (FfiErrorCode::Unauthorized, *status),
            ApiError::Forbidden { .. } => (FfiErrorCode::Forbidden, 403),
            ApiError::Validation { status, .. } => (FfiErrorCode::Validation, *status),
            ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
            ApiError::Transport(_) | ApiError::InFlight => (FfiErrorCode::Transport, 0),
        };
        let field_errors = match code {
            FfiErrorCode::Validation => serde_json::to_string(&err.field_errors())
                .map(c_string)
                .unwrap_or(std::ptr::null_mut()),
            _ => std::ptr::null_mut(),
        };
        Self::failure(code, status, err.message(), field_errors)
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(
            FfiErrorCode::NullArg,
            0,
            format!("null argument: {name}"),
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, 0, msg.to_string(), std::ptr::null_mut())
    }
}

/// Resolved theme as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiTheme {
    Light = 0,
    Dark = 1,
}

impl From<ResolvedTheme> for FfiTheme {
    fn from(theme: ResolvedTheme) -> Self {
        match theme {
            ResolvedTheme::Light => FfiTheme::Light,
            ResolvedTheme::Dark => FfiTheme::Dark,
        }
    }
}
