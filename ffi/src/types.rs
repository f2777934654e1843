//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use todo_core::error::ApiError;
use todo_core::http::HttpMethod;
use todo_core::view_model::{Command, SyncState, TodoEntry};
use todo_core::{Todo, TodoClient, TodoListViewModel, TodoPage};

/// Opaque handle to a `TodoClient`. C callers receive a pointer to this
/// and pass it back into every client function.
pub struct FfiTodoClient {
    pub(crate) inner: TodoClient,
}

/// Opaque handle to a view-model plus the client used to turn its commands
/// into requests.
pub struct FfiTodoView {
    pub(crate) inner: TodoListViewModel,
    pub(crate) client: TodoClient,
}

/// Copy a Rust string into a heap-allocated C string. Interior NULs are
/// dropped rather than failing the whole call.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let s: String = s.into();
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

pub(crate) fn c_string_opt(s: Option<String>) -> *mut c_char {
    s.map_or(std::ptr::null_mut(), c_string)
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Post = 0,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Post => FfiHttpMethod::Post,
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
/// The C caller executes the request and passes the response back through
/// `todo_parse_*` or `todo_view_complete_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: todo_core::HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Vec<FfiHeader> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            // Boxed slice so capacity == len when reclaimed in `free`.
            Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body: c_string(req.body),
        }))
    }

    /// Release a request produced by `from_core`.
    ///
    /// # Safety
    /// `req` must come from `from_core` and not have been freed.
    pub(crate) unsafe fn free(req: *mut Self) {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a parse or completion function. The FFI layer
/// reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned across the boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Unauthorized = 1,
    Http = 2,
    GraphQl = 3,
    MissingData = 4,
    Deserialization = 5,
    Serialization = 6,
    Transport = 7,
    TooManyPages = 8,
    Panic = 9,
    NullArg = 10,
}

impl FfiErrorCode {
    pub(crate) fn of(err: &ApiError) -> (Self, u16) {
        match err {
            ApiError::Unauthorized { status, .. } => (FfiErrorCode::Unauthorized, *status),
            ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::GraphQl(_) => (FfiErrorCode::GraphQl, 0),
            ApiError::MissingData(_) => (FfiErrorCode::MissingData, 0),
            ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::TooManyPages(_) => (FfiErrorCode::TooManyPages, 0),
        }
    }
}

/// Tag that tells `todo_free_result` what `FfiTodoResult::data` points to.
#[repr(C)]
pub enum FfiDataTag {
    None = 0,
    Todo = 1,
    TodoPage = 2,
}

/// A single todo item exposed to C. `description` may be null.
#[repr(C)]
pub struct FfiTodo {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub description: *mut c_char,
}

impl FfiTodo {
    fn from_core(todo: Todo) -> Self {
        FfiTodo {
            id: c_string(todo.id.to_string()),
            name: c_string(todo.name),
            description: c_string_opt(todo.description),
        }
    }

    /// Free the C-string fields (but not the struct itself).
    pub(crate) fn free_fields(&self) {
        free_c_string(self.id);
        free_c_string(self.name);
        free_c_string(self.description);
    }
}

/// One page of todo items exposed to C. `next_token` is null on the last page.
#[repr(C)]
pub struct FfiTodoPage {
    pub items: *mut FfiTodo,
    pub len: u32,
    pub next_token: *mut c_char,
}

/// Result envelope for the parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiTodoResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiTodoResult {
    fn boxed(error_code: FfiErrorCode, error_message: *mut c_char, http_status: u16, data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiTodoResult {
            error_code,
            error_message,
            http_status,
            data_tag,
            data,
        }))
    }

    /// Build a success result carrying a single `FfiTodo`.
    pub(crate) fn ok_todo(todo: Todo) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiTodo::from_core(todo))) as *mut c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, FfiDataTag::Todo, data)
    }

    /// Build a success result carrying an `FfiTodoPage`.
    pub(crate) fn ok_todo_page(page: TodoPage) -> *mut Self {
        let len = page.items.len() as u32;
        let items = if page.items.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_todos: Vec<FfiTodo> = page.items.into_iter().map(FfiTodo::from_core).collect();
            Box::into_raw(ffi_todos.into_boxed_slice()) as *mut FfiTodo
        };
        let ffi_page = Box::new(FfiTodoPage {
            items,
            len,
            next_token: c_string_opt(page.next_token),
        });
        let data = Box::into_raw(ffi_page) as *mut c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, FfiDataTag::TodoPage, data)
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (code, http_status) = FfiErrorCode::of(&err);
        Self::boxed(code, c_string(err.to_string()), http_status, FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let msg = format!("null argument: {name}");
        Self::boxed(FfiErrorCode::NullArg, c_string(msg), 0, FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, c_string(msg), 0, FfiDataTag::None, std::ptr::null_mut())
    }
}

// ---------------------------------------------------------------------------
// View-model types
// ---------------------------------------------------------------------------

/// Which draft field `todo_view_set_field` updates.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub enum FfiDraftField {
    Name = 0,
    Description = 1,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiCommandKind {
    Fetch = 0,
    Create = 1,
}

/// Work the host must perform: execute `request`, then call
/// `todo_view_complete_fetch` or `todo_view_complete_create` with `token`.
#[repr(C)]
pub struct FfiCommand {
    pub kind: FfiCommandKind,
    pub token: u64,
    pub request: *mut FfiHttpRequest,
}

impl FfiCommand {
    /// Turn a view-model command into a heap-allocated `FfiCommand`.
    pub(crate) fn from_core(client: &TodoClient, cmd: Command) -> Result<*mut Self, ApiError> {
        let (kind, token, request) = match cmd {
            Command::Fetch { ticket, page } => {
                (FfiCommandKind::Fetch, ticket.get(), client.build_list_todos(&page)?)
            }
            Command::Create { key, input } => {
                (FfiCommandKind::Create, key.get(), client.build_create_todo(&input)?)
            }
        };
        Ok(Box::into_raw(Box::new(FfiCommand {
            kind,
            token,
            request: FfiHttpRequest::from_core(request),
        })))
    }
}

/// Outcome of a view operation.
///
/// `next` is non-null when a request must be executed: the initial fetch, a
/// create, or the next page of a fetch. The list has already been updated
/// either way.
#[repr(C)]
pub struct FfiViewStep {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub next: *mut FfiCommand,
}

impl FfiViewStep {
    pub(crate) fn ok(next: *mut FfiCommand) -> *mut Self {
        Box::into_raw(Box::new(FfiViewStep {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            next,
        }))
    }

    pub(crate) fn error(code: FfiErrorCode, message: impl Into<String>) -> *mut Self {
        Box::into_raw(Box::new(FfiViewStep {
            error_code: code,
            error_message: c_string(message),
            next: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (code, _) = FfiErrorCode::of(&err);
        Self::error(code, err.to_string())
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiSyncState {
    Confirmed = 0,
    Pending = 1,
    Failed = 2,
}

/// One list row. `id`, `description` and `failure_reason` may be null.
#[repr(C)]
pub struct FfiEntry {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub description: *mut c_char,
    pub state: FfiSyncState,
    pub failure_reason: *mut c_char,
}

impl FfiEntry {
    pub(crate) fn from_core(entry: &TodoEntry) -> *mut Self {
        let (state, failure_reason) = match &entry.sync {
            SyncState::Confirmed => (FfiSyncState::Confirmed, None),
            SyncState::Pending(_) => (FfiSyncState::Pending, None),
            SyncState::Failed { reason, .. } => (FfiSyncState::Failed, Some(reason.clone())),
        };
        Box::into_raw(Box::new(FfiEntry {
            id: c_string_opt(entry.id.as_ref().map(|id| id.to_string())),
            name: c_string(entry.name.clone()),
            description: c_string_opt(entry.description.clone()),
            state,
            failure_reason: c_string_opt(failure_reason),
        }))
    }
}
