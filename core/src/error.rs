//! Error types for the todo API client.
//!
//! # Design
//! Authorization failures get a dedicated variant because a host typically
//! sends the user back through sign-in on them. GraphQL-level failures arrive
//! with HTTP 200 and keep the server's error list intact. All other non-2xx
//! responses land in `HttpError` with the raw status code and body.

use thiserror::Error;

use crate::graphql::GraphQlError;

/// Errors returned by `TodoClient` parse methods and by transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 401 or 403.
    #[error("unauthorized (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The server returned a non-2xx status other than 401/403.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response carried a non-empty GraphQL `errors` array.
    #[error("GraphQL error: {}", join_errors(.0))]
    GraphQl(Vec<GraphQlError>),

    /// The response had no data for the named root field.
    #[error("response contained no `{0}` data")]
    MissingData(&'static str),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The host could not complete the HTTP round-trip.
    #[error("transport error: {0}")]
    Transport(String),

    /// A list fetch kept returning continuation tokens.
    #[error("list query exceeded {0} pages")]
    TooManyPages(usize),
}

fn join_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while loading an [`ApiConfig`](crate::config::ApiConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config has no GraphQL endpoint")]
    MissingEndpoint,

    #[error("authentication type {0} requires `{1}`")]
    MissingCredential(String, &'static str),

    #[error("unsupported authentication type: {0}")]
    UnsupportedAuth(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_errors_are_joined() {
        let err = ApiError::GraphQl(vec![
            GraphQlError::new("Unauthorized", "no"),
            GraphQlError::new("ValidationError", "bad input"),
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL error: Unauthorized: no; ValidationError: bad input"
        );
    }

    #[test]
    fn http_error_display() {
        let err = ApiError::HttpError {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
    }
}
