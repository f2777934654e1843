//! Stateless GraphQL request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only the endpoint and the auth mode and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. The caller executes the actual HTTP round-trip, keeping
//! the core deterministic and free of I/O dependencies.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::config::{ApiConfig, AuthMode};
use crate::error::ApiError;
use crate::graphql::{
    CreateTodoData, GraphQlRequest, GraphQlResponse, ListTodosData, CREATE_TODO,
    CREATE_TODO_OPERATION, LIST_TODOS, LIST_TODOS_OPERATION,
};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodoInput, PageRequest, Todo, TodoPage};

/// Synchronous, stateless client for the todo GraphQL API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    endpoint: String,
    auth: AuthMode,
}

impl TodoClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth: AuthMode::None,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.endpoint).with_auth(config.auth.clone())
    }

    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build_list_todos(&self, page: &PageRequest) -> Result<HttpRequest, ApiError> {
        self.build(LIST_TODOS, LIST_TODOS_OPERATION, page)
    }

    pub fn build_create_todo(&self, input: &CreateTodoInput) -> Result<HttpRequest, ApiError> {
        self.build(CREATE_TODO, CREATE_TODO_OPERATION, json!({ "input": input }))
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<TodoPage, ApiError> {
        let data: ListTodosData = parse_graphql(response)?;
        data.list_todos.ok_or(ApiError::MissingData("listTodos"))
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        let data: CreateTodoData = parse_graphql(response)?;
        data.create_todo.ok_or(ApiError::MissingData("createTodo"))
    }

    fn build<V: Serialize>(
        &self,
        document: &str,
        operation: &str,
        variables: V,
    ) -> Result<HttpRequest, ApiError> {
        let payload = GraphQlRequest {
            query: document.to_string(),
            operation_name: Some(operation.to_string()),
            variables,
        };
        let body =
            serde_json::to_string(&payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;

        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        headers.extend(self.auth.header());

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint.clone(),
            headers,
            body,
        })
    }
}

/// Map status codes and the GraphQL envelope to either `data` or an `ApiError`.
fn parse_graphql<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    let envelope: GraphQlResponse<T> = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    if !envelope.errors.is_empty() {
        return Err(ApiError::GraphQl(envelope.errors));
    }
    envelope
        .data
        .ok_or_else(|| ApiError::DeserializationError("response has neither data nor errors".to_string()))
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        200..=299 => Ok(()),
        401 | 403 => Err(ApiError::Unauthorized {
            status: response.status,
            message: unauthorized_message(&response.body),
        }),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

/// Prefer the first GraphQL error message from a 401 body, else the raw body.
fn unauthorized_message(body: &str) -> String {
    serde_json::from_str::<GraphQlResponse<serde_json::Value>>(body)
        .ok()
        .and_then(|r| r.errors.into_iter().next())
        .map(|e| e.message)
        .unwrap_or_else(|| body.to_string())
}
