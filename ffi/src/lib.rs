//! C-ABI wrapper around `todo-core`.
//!
//! # Overview
//! Exposes the todo GraphQL client and the list view-model through
//! `extern "C"` functions, so a native UI shell can own the widgets and the
//! network stack while Rust owns request building, response parsing and the
//! optimistic list state.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Client functions mirror the core `build_*` / `parse_*` API 1:1.
//! - View functions return an `FfiViewStep`. Its `next` command, when
//!   present, carries a ready request; the host executes it and reports back
//!   with the command's `token`.
//! - The C caller owns all returned pointers and must call the matching
//!   `todo_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use todo_core::http::HttpResponse;
use todo_core::view_model::{Command, DraftField, FetchTicket, PendingKey};
use todo_core::{ApiError, AuthMode, CreateTodoInput, PageRequest, Session, TodoListViewModel};

use types::*;

/// Read a nullable C string. Invalid UTF-8 reads as empty.
fn opt_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("").to_string())
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `TodoClient` bound to `endpoint`.
///
/// `api_key` may be null for an endpoint without API-key auth.
/// Returns null if `endpoint` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `todo_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_client_new(
    endpoint: *const c_char,
    api_key: *const c_char,
) -> *mut FfiTodoClient {
    catch_unwind(|| {
        let Some(url) = opt_str(endpoint) else {
            return std::ptr::null_mut();
        };
        let auth = match opt_str(api_key) {
            Some(key) if !key.is_empty() => AuthMode::ApiKey(key),
            _ => AuthMode::None,
        };
        let client = todo_core::TodoClient::new(&url).with_auth(auth);
        Box::into_raw(Box::new(FfiTodoClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a `TodoClient` created by `todo_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_client_free(client: *mut FfiTodoClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a `ListTodos` request.
///
/// `limit` of 0 lets the server choose the page size; `next_token` may be
/// null for the first page. Returns null if `client` is null.
/// The caller must free the returned pointer with `todo_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_build_list_todos(
    client: *const FfiTodoClient,
    limit: u32,
    next_token: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let page = PageRequest {
            limit: (limit > 0).then_some(limit),
            next_token: opt_str(next_token),
        };
        match client.inner.build_list_todos(&page) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a `CreateTodo` request.
///
/// `description` may be null. Returns null if `client` or `name` is null,
/// or if serialization fails.
#[unsafe(no_mangle)]
pub extern "C" fn todo_build_create_todo(
    client: *const FfiTodoClient,
    name: *const c_char,
    description: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(name) = opt_str(name) else {
            return std::ptr::null_mut();
        };
        let client = unsafe { &*client };
        let input = CreateTodoInput {
            id: None,
            name,
            description: opt_str(description),
        };
        match client.inner.build_create_todo(&input) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body reads
/// as the empty string.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse::new(resp.status, opt_str(resp.body).unwrap_or_default())
}

/// Parse the response to a `ListTodos` request.
///
/// Returns a result with `data_tag = TodoPage` on success.
#[unsafe(no_mangle)]
pub extern "C" fn todo_parse_list_todos(
    client: *const FfiTodoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiTodoResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiTodoResult::null_arg("client");
        }
        if response.is_null() {
            return FfiTodoResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_list_todos(ffi_response_to_core(resp)) {
            Ok(page) => FfiTodoResult::ok_todo_page(page),
            Err(e) => FfiTodoResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiTodoResult::panic("panic in todo_parse_list_todos"))
}

/// Parse the response to a `CreateTodo` request.
///
/// Returns a result with `data_tag = Todo` on success.
#[unsafe(no_mangle)]
pub extern "C" fn todo_parse_create_todo(
    client: *const FfiTodoClient,
    response: *const FfiHttpResponse,
) -> *mut FfiTodoResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiTodoResult::null_arg("client");
        }
        if response.is_null() {
            return FfiTodoResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_create_todo(ffi_response_to_core(resp)) {
            Ok(todo) => FfiTodoResult::ok_todo(todo),
            Err(e) => FfiTodoResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiTodoResult::panic("panic in todo_parse_create_todo"))
}

// ---------------------------------------------------------------------------
// View-model
// ---------------------------------------------------------------------------

/// Create a view bound to a copy of `client`.
///
/// `page_size` of 0 lets the server choose. Returns null if `client` is null.
/// The caller must free the returned pointer with `todo_view_free`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_new(client: *const FfiTodoClient, page_size: u32) -> *mut FfiTodoView {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let inner = TodoListViewModel::new().with_page_size((page_size > 0).then_some(page_size));
        Box::into_raw(Box::new(FfiTodoView {
            inner,
            client: client.inner.clone(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a view created by `todo_view_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_free(view: *mut FfiTodoView) {
    if !view.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(view) });
        });
    }
}

/// Package a view-model command as a step for the host.
///
/// No command gives an `Ok` step with a null `next`. If the request cannot be
/// built, the failure is fed back into the view so no fetch stays in flight
/// and no entry stays pending, and the step carries the error.
fn command_step(view: &mut FfiTodoView, cmd: Option<Command>) -> *mut FfiViewStep {
    command_step_with(view, cmd, FfiCommand::from_core)
}

fn command_step_with(
    view: &mut FfiTodoView,
    cmd: Option<Command>,
    build: impl FnOnce(&todo_core::TodoClient, Command) -> Result<*mut FfiCommand, ApiError>,
) -> *mut FfiViewStep {
    let Some(cmd) = cmd else {
        return FfiViewStep::ok(std::ptr::null_mut());
    };
    let origin = match &cmd {
        Command::Fetch { ticket, .. } => Ok(*ticket),
        Command::Create { key, .. } => Err(*key),
    };
    let err = match build(&view.client, cmd) {
        Ok(ptr) => return FfiViewStep::ok(ptr),
        Err(err) => err,
    };
    let settled = match origin {
        Ok(ticket) => view.inner.complete_fetch(ticket, Err(err)).map(|_| ()),
        Err(key) => view.inner.complete_create(key, Err(err)),
    };
    match settled {
        Err(err) => FfiViewStep::from_error(err),
        Ok(()) => FfiViewStep::ok(std::ptr::null_mut()),
    }
}

/// First-render hook. The step's `next` is the initial fetch, or null on every
/// later call. Free the step with `todo_free_step`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_mount(view: *mut FfiTodoView) -> *mut FfiViewStep {
    catch_unwind(|| {
        if view.is_null() {
            return FfiViewStep::error(FfiErrorCode::NullArg, "null argument: view");
        }
        let view = unsafe { &mut *view };
        let cmd = view.inner.mount();
        command_step(view, cmd)
    })
    .unwrap_or_else(|_| FfiViewStep::error(FfiErrorCode::Panic, "panic in todo_view_mount"))
}

/// Start a new fetch of the whole list, superseding any in flight.
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_refresh(view: *mut FfiTodoView) -> *mut FfiViewStep {
    catch_unwind(|| {
        if view.is_null() {
            return FfiViewStep::error(FfiErrorCode::NullArg, "null argument: view");
        }
        let view = unsafe { &mut *view };
        let cmd = view.inner.refresh();
        command_step(view, Some(cmd))
    })
    .unwrap_or_else(|_| FfiViewStep::error(FfiErrorCode::Panic, "panic in todo_view_refresh"))
}

/// Set one draft field. A null `value` clears the field.
/// Returns false if `view` is null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_set_field(
    view: *mut FfiTodoView,
    field: FfiDraftField,
    value: *const c_char,
) -> bool {
    catch_unwind(|| {
        if view.is_null() {
            return false;
        }
        let view = unsafe { &mut *view };
        let field = match field {
            FfiDraftField::Name => DraftField::Name,
            FfiDraftField::Description => DraftField::Description,
        };
        view.inner.set_field(field, opt_str(value).unwrap_or_default());
        true
    })
    .unwrap_or(false)
}

/// Submit the draft. The step's `next` is the create command, or null when
/// the draft was incomplete (in which case nothing changed).
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_submit(view: *mut FfiTodoView) -> *mut FfiViewStep {
    catch_unwind(|| {
        if view.is_null() {
            return FfiViewStep::error(FfiErrorCode::NullArg, "null argument: view");
        }
        let view = unsafe { &mut *view };
        let cmd = view.inner.submit();
        command_step(view, cmd)
    })
    .unwrap_or_else(|_| FfiViewStep::error(FfiErrorCode::Panic, "panic in todo_view_submit"))
}

/// Report the response to a `Fetch` command.
///
/// Pass a null `response` when the request could not be sent at all.
/// Free the returned step with `todo_free_step`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_complete_fetch(
    view: *mut FfiTodoView,
    token: u64,
    response: *const FfiHttpResponse,
) -> *mut FfiViewStep {
    catch_unwind(|| {
        if view.is_null() {
            return FfiViewStep::error(FfiErrorCode::NullArg, "null argument: view");
        }
        let view = unsafe { &mut *view };
        let result = if response.is_null() {
            Err(ApiError::Transport("no response".to_string()))
        } else {
            view.client.parse_list_todos(ffi_response_to_core(unsafe { &*response }))
        };
        match view.inner.complete_fetch(FetchTicket::from(token), result) {
            Ok(next) => command_step(view, next),
            Err(e) => FfiViewStep::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiViewStep::error(FfiErrorCode::Panic, "panic in todo_view_complete_fetch"))
}

/// Report the response to a `Create` command.
///
/// Pass a null `response` when the request could not be sent at all. On
/// failure the entry stays in the list, marked as failed.
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_complete_create(
    view: *mut FfiTodoView,
    token: u64,
    response: *const FfiHttpResponse,
) -> *mut FfiViewStep {
    catch_unwind(|| {
        if view.is_null() {
            return FfiViewStep::error(FfiErrorCode::NullArg, "null argument: view");
        }
        let view = unsafe { &mut *view };
        let result = if response.is_null() {
            Err(ApiError::Transport("no response".to_string()))
        } else {
            view.client.parse_create_todo(ffi_response_to_core(unsafe { &*response }))
        };
        match view.inner.complete_create(PendingKey::from(token), result) {
            Ok(()) => FfiViewStep::ok(std::ptr::null_mut()),
            Err(e) => FfiViewStep::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiViewStep::error(FfiErrorCode::Panic, "panic in todo_view_complete_create"))
}

/// Number of rows in the list. Returns 0 if `view` is null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_len(view: *const FfiTodoView) -> u32 {
    catch_unwind(|| {
        if view.is_null() {
            return 0;
        }
        let view = unsafe { &*view };
        view.inner.entries().len() as u32
    })
    .unwrap_or(0)
}

/// Copy row `index`. Returns null if `view` is null or `index` is out of range.
/// Free the entry with `todo_free_entry`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_entry(view: *const FfiTodoView, index: u32) -> *mut FfiEntry {
    catch_unwind(|| {
        if view.is_null() {
            return std::ptr::null_mut();
        }
        let view = unsafe { &*view };
        view.inner
            .entries()
            .get(index as usize)
            .map_or(std::ptr::null_mut(), FfiEntry::from_core)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Render the page as text for `username` (null for an anonymous greeting).
/// Free the string with `todo_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn todo_view_render(view: *const FfiTodoView, username: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        if view.is_null() {
            return std::ptr::null_mut();
        }
        let view = unsafe { &*view };
        let session = opt_str(username).map_or_else(Session::anonymous, Session::signed_in);
        c_string(todo_core::render::render(&view.inner, &session))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `todo_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiHttpRequest::free(req) });
}

/// Free an `FfiTodoResult` returned by any `todo_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_result(result: *mut FfiTodoResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Todo => {
                let todo = unsafe { Box::from_raw(result.data as *mut FfiTodo) };
                todo.free_fields();
            }
            FfiDataTag::TodoPage => {
                let page = unsafe { Box::from_raw(result.data as *mut FfiTodoPage) };
                free_c_string(page.next_token);
                if !page.items.is_null() && page.len > 0 {
                    let slice = std::ptr::slice_from_raw_parts_mut(page.items, page.len as usize);
                    let items = unsafe { Box::from_raw(slice) };
                    for item in items.iter() {
                        item.free_fields();
                    }
                }
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a command and the request it carries. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_command(cmd: *mut FfiCommand) {
    if cmd.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let cmd = unsafe { Box::from_raw(cmd) };
        if !cmd.request.is_null() {
            unsafe { FfiHttpRequest::free(cmd.request) };
        }
    });
}

/// Free a step and any follow-up command it carries. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_step(step: *mut FfiViewStep) {
    if step.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let step = unsafe { Box::from_raw(step) };
        free_c_string(step.error_message);
        todo_free_command(step.next);
    });
}

/// Free an entry returned by `todo_view_entry`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_entry(entry: *mut FfiEntry) {
    if entry.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let entry = unsafe { Box::from_raw(entry) };
        free_c_string(entry.id);
        free_c_string(entry.name);
        free_c_string(entry.description);
        free_c_string(entry.failure_reason);
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn todo_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
