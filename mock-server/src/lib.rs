use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const GRAPHQL_PATH: &str = "/graphql";
pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const MAX_PAGE_LIMIT: usize = 1000;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Opaque identifier; generated ids are v4 UUIDs.
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Option<Value>,
}

#[derive(Deserialize)]
struct CreateTodoInput {
    id: Option<String>,
    name: String,
    description: Option<String>,
}

#[derive(Deserialize)]
struct CreateTodoVariables {
    input: CreateTodoInput,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTodosVariables {
    limit: Option<usize>,
    next_token: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// When set, requests must carry a matching `x-api-key` header.
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    todos: Arc<RwLock<Vec<Todo>>>,
    api_key: Option<Arc<str>>,
}

pub fn app() -> Router {
    app_with(ServerConfig::default())
}

pub fn app_with(config: ServerConfig) -> Router {
    let state = AppState {
        todos: Arc::new(RwLock::new(Vec::new())),
        api_key: config.api_key.map(Arc::from),
    };
    Router::new()
        .route(GRAPHQL_PATH, post(graphql))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, ServerConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: ServerConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn graphql(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GraphQlRequest>,
) -> Response {
    if let Some(expected) = state.api_key.as_deref() {
        let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if presented != Some(expected) {
            tracing::warn!("rejecting request with missing or wrong api key");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "errors": [{
                        "errorType": "UnauthorizedException",
                        "message": "You are not authorized to make this call."
                    }]
                })),
            )
                .into_response();
        }
    }

    let variables = request.variables.unwrap_or(Value::Null);
    let body = match operation_of(&request.query, request.operation_name.as_deref()) {
        Some(Operation::ListTodos) => list_todos(&state, variables).await,
        Some(Operation::CreateTodo) => create_todo(&state, variables).await,
        None => error_body(Value::Null, "UnsupportedOperation", "Unsupported operation"),
    };
    Json(body).into_response()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    ListTodos,
    CreateTodo,
}

/// Pick the operation by name, falling back to the root field in the document.
fn operation_of(query: &str, operation_name: Option<&str>) -> Option<Operation> {
    match operation_name {
        Some("ListTodos") => Some(Operation::ListTodos),
        Some("CreateTodo") => Some(Operation::CreateTodo),
        _ if query.contains("createTodo") => Some(Operation::CreateTodo),
        _ if query.contains("listTodos") => Some(Operation::ListTodos),
        _ => None,
    }
}

async fn list_todos(state: &AppState, variables: Value) -> Value {
    let vars: ListTodosVariables = if variables.is_null() {
        ListTodosVariables::default()
    } else {
        match serde_json::from_value(variables) {
            Ok(v) => v,
            Err(e) => return error_body(json!({ "listTodos": null }), "ValidationError", e.to_string()),
        }
    };

    let offset = match vars.next_token.as_deref().map(str::parse::<usize>) {
        None => 0,
        Some(Ok(offset)) => offset,
        Some(Err(_)) => {
            return error_body(
                json!({ "listTodos": null }),
                "InvalidNextToken",
                "Invalid pagination token given.",
            )
        }
    };
    let limit = vars.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);

    let todos = state.todos.read().await;
    let start = offset.min(todos.len());
    let end = (start + limit).min(todos.len());
    let next_token = (end < todos.len()).then(|| end.to_string());
    tracing::debug!(start, end, total = todos.len(), "listTodos");

    json!({
        "data": {
            "listTodos": {
                "items": &todos[start..end],
                "nextToken": next_token,
            }
        }
    })
}

async fn create_todo(state: &AppState, variables: Value) -> Value {
    let vars: CreateTodoVariables = match serde_json::from_value(variables) {
        Ok(v) => v,
        Err(e) => return error_body(json!({ "createTodo": null }), "ValidationError", e.to_string()),
    };
    let input = vars.input;
    if input.name.trim().is_empty() {
        return error_body(
            json!({ "createTodo": null }),
            "ValidationError",
            "name must not be empty",
        );
    }

    let mut todos = state.todos.write().await;
    let id = input.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    if todos.iter().any(|t| t.id == id) {
        return error_body(
            json!({ "createTodo": null }),
            "DynamoDB:ConditionalCheckFailedException",
            "The conditional request failed",
        );
    }

    let now = Utc::now();
    let todo = Todo {
        id,
        name: input.name,
        description: input.description,
        created_at: now,
        updated_at: now,
    };
    todos.push(todo.clone());
    tracing::debug!(id = %todo.id, "createTodo");

    json!({ "data": { "createTodo": todo } })
}

fn error_body(data: Value, error_type: &str, message: impl Into<String>) -> Value {
    json!({
        "data": data,
        "errors": [{ "errorType": error_type, "message": message.into() }]
    })
}
