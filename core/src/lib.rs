//! Synchronous client core for a GraphQL-backed todo list.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and keeps the page state
//! (form draft plus list) in a view-model that emits commands instead of
//! performing calls.
//!
//! # Design
//! - `TodoClient` is stateless: it holds only the endpoint and auth mode.
//! - Each operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit.
//! - `TodoListViewModel` applies optimistic updates and reconciles them with
//!   create results and later fetches.
//! - `TodoApp` wires one configured `TodoApi` into the view-model for hosts
//!   that can block on I/O.
//! - Types use owned `String` / `Vec` fields to simplify FFI mapping.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod graphql;
pub mod http;
pub mod remote;
pub mod render;
pub mod session;
pub mod types;
pub mod view_model;

pub use app::{Submission, TodoApp};
pub use client::TodoClient;
pub use config::{ApiConfig, AuthMode};
pub use error::{ApiError, ConfigError};
pub use graphql::GraphQlError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use remote::{RemoteTodos, TodoApi, Transport};
pub use session::Session;
pub use types::{CreateTodoInput, PageRequest, Todo, TodoId, TodoPage};
pub use view_model::{
    Command, Draft, DraftField, EntryKey, FetchTicket, PendingKey, SyncState, TodoEntry,
    TodoListViewModel,
};
