//! GraphQL documents and the JSON envelope they travel in.
//!
//! Only the two operations the view needs are defined. The selection sets
//! match the fields of [`Todo`](crate::types::Todo).

use std::fmt;

use serde::{Deserialize, Serialize};

pub const LIST_TODOS_OPERATION: &str = "ListTodos";
pub const CREATE_TODO_OPERATION: &str = "CreateTodo";

pub const LIST_TODOS: &str = "query ListTodos($limit: Int, $nextToken: String) {
  listTodos(limit: $limit, nextToken: $nextToken) {
    items {
      id
      name
      description
      createdAt
      updatedAt
    }
    nextToken
  }
}";

pub const CREATE_TODO: &str = "mutation CreateTodo($input: CreateTodoInput!) {
  createTodo(input: $input) {
    id
    name
    description
    createdAt
    updatedAt
  }
}";

/// Request body for a GraphQL-over-HTTP POST.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest<V> {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    pub variables: V,
}

/// Response envelope. Both `data` and `errors` may be present at once.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// A single entry of the `errors` array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<serde_json::Value>,
}

impl GraphQlError {
    pub fn new(error_type: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: Some(error_type.to_string()),
            path: Vec::new(),
        }
    }
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_type {
            Some(kind) => write!(f, "{kind}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// `data` payload of `ListTodos`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListTodosData {
    pub list_todos: Option<crate::types::TodoPage>,
}

/// `data` payload of `CreateTodo`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTodoData {
    pub create_todo: Option<crate::types::Todo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_operation_name_in_camel_case() {
        let req = GraphQlRequest {
            query: LIST_TODOS.to_string(),
            operation_name: Some(LIST_TODOS_OPERATION.to_string()),
            variables: serde_json::json!({}),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["operationName"], "ListTodos");
        assert!(json["query"].as_str().unwrap().contains("listTodos"));
    }

    #[test]
    fn response_with_errors_and_null_data() {
        let raw = r#"{"data":null,"errors":[{"message":"boom","errorType":"DynamoDB:Failure"}]}"#;
        let resp: GraphQlResponse<ListTodosData> = serde_json::from_str(raw).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors.len(), 1);
        assert_eq!(resp.errors[0].to_string(), "DynamoDB:Failure: boom");
    }

    #[test]
    fn response_without_errors_field() {
        let raw = r#"{"data":{"createTodo":null}}"#;
        let resp: GraphQlResponse<CreateTodoData> = serde_json::from_str(raw).unwrap();
        assert!(resp.errors.is_empty());
        assert!(resp.data.unwrap().create_todo.is_none());
    }

    #[test]
    fn error_without_type_displays_message_only() {
        let err = GraphQlError {
            message: "plain".to_string(),
            error_type: None,
            path: Vec::new(),
        };
        assert_eq!(err.to_string(), "plain");
    }
}
