//! Seams between the view-model and the network.
//!
//! [`Transport`] is the host's half of the host-does-IO split: it executes one
//! `HttpRequest`. [`TodoApi`] is what [`TodoApp`](crate::app::TodoApp)
//! depends on, so tests can substitute an in-memory implementation without
//! any HTTP at all.

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{CreateTodoInput, PageRequest, Todo, TodoPage};

/// Executes an HTTP round-trip on behalf of the core.
///
/// Non-2xx statuses are returned as data, not as `Err`; only failures to
/// obtain a response at all should map to [`ApiError::Transport`].
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<F> Transport for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse, ApiError>,
{
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self(request)
    }
}

/// The two remote operations the todo view needs.
pub trait TodoApi {
    fn list_todos(&self, page: &PageRequest) -> Result<TodoPage, ApiError>;
    fn create_todo(&self, input: &CreateTodoInput) -> Result<Todo, ApiError>;
}

/// `TodoApi` over GraphQL: a `TodoClient` paired with a host transport.
#[derive(Debug, Clone)]
pub struct RemoteTodos<T> {
    client: TodoClient,
    transport: T,
}

impl<T: Transport> RemoteTodos<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }
}

impl<T: Transport> TodoApi for RemoteTodos<T> {
    fn list_todos(&self, page: &PageRequest) -> Result<TodoPage, ApiError> {
        let request = self.client.build_list_todos(page)?;
        let response = self.transport.execute(request)?;
        self.client.parse_list_todos(response)
    }

    fn create_todo(&self, input: &CreateTodoInput) -> Result<Todo, ApiError> {
        let request = self.client.build_create_todo(input)?;
        let response = self.transport.execute(request)?;
        self.client.parse_create_todo(response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn list_todos_runs_request_through_transport() {
        let seen = RefCell::new(Vec::new());
        let transport = |req: HttpRequest| -> Result<HttpResponse, ApiError> {
            seen.borrow_mut().push(req);
            Ok(HttpResponse::new(
                200,
                r#"{"data":{"listTodos":{"items":[],"nextToken":"t1"}}}"#,
            ))
        };
        let api = RemoteTodos::new(TodoClient::new("http://api/graphql"), transport);

        let page = api.list_todos(&PageRequest::first(Some(5))).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_token.as_deref(), Some("t1"));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "http://api/graphql");
        assert!(seen[0].body.contains(r#""limit":5"#));
    }

    #[test]
    fn transport_failure_is_propagated() {
        let transport =
            |_req: HttpRequest| -> Result<HttpResponse, ApiError> { Err(ApiError::Transport("refused".into())) };
        let api = RemoteTodos::new(TodoClient::new("http://api/graphql"), transport);

        let err = api.create_todo(&CreateTodoInput::new("a", "b")).unwrap_err();
        assert!(matches!(err, ApiError::Transport(ref m) if m == "refused"));
    }
}
