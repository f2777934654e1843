//! Endpoint and authentication configuration.
//!
//! `ApiConfig` is constructed once at application start and handed to
//! [`TodoClient::from_config`](crate::client::TodoClient::from_config). It can
//! be read from the JSON file the managed backend's tooling emits
//! (`aws_appsync_*` keys).

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// How requests are authorized against the GraphQL endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    None,
    /// Sent as `x-api-key`.
    ApiKey(String),
    /// A bearer token from the identity provider, sent as `authorization`.
    UserPool(String),
}

impl AuthMode {
    /// Header the mode contributes to every request, if any.
    pub fn header(&self) -> Option<(String, String)> {
        match self {
            AuthMode::None => None,
            AuthMode::ApiKey(key) => Some(("x-api-key".to_string(), key.clone())),
            AuthMode::UserPool(token) => Some(("authorization".to_string(), token.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub endpoint: String,
    pub auth: AuthMode,
    /// `limit` sent with each list page; `None` lets the server decide.
    pub page_size: Option<u32>,
}

impl ApiConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth: AuthMode::None,
            page_size: None,
        }
    }

    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_endpoint(path, None)
    }

    /// Like [`load`](Self::load), but `endpoint` replaces the file's endpoint,
    /// which may then be absent.
    pub fn load_with_endpoint(path: &Path, endpoint: Option<&str>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_with_endpoint(&raw, endpoint)
    }

    /// Parse the backend tooling's JSON configuration.
    ///
    /// `USER_POOL` configs carry no token; the token comes from the signed-in
    /// session, so it starts empty and is filled in by the host.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Self::from_json_with_endpoint(raw, None)
    }

    pub fn from_json_with_endpoint(raw: &str, endpoint: Option<&str>) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(raw)?;
        let endpoint = endpoint
            .map(str::to_string)
            .or(file.endpoint)
            .filter(|e| !e.trim().is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;

        let auth = match file.auth_type.as_deref() {
            None | Some("NONE") => AuthMode::None,
            Some("API_KEY") => match file.api_key {
                Some(key) if !key.is_empty() => AuthMode::ApiKey(key),
                _ => {
                    return Err(ConfigError::MissingCredential(
                        "API_KEY".to_string(),
                        "aws_appsync_apiKey",
                    ))
                }
            },
            Some("AMAZON_COGNITO_USER_POOLS") => AuthMode::UserPool(String::new()),
            Some(other) => return Err(ConfigError::UnsupportedAuth(other.to_string())),
        };

        Ok(Self {
            endpoint,
            auth,
            page_size: file.page_size,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "aws_appsync_graphqlEndpoint")]
    endpoint: Option<String>,
    #[serde(rename = "aws_appsync_authenticationType")]
    auth_type: Option<String>,
    #[serde(rename = "aws_appsync_apiKey")]
    api_key: Option<String>,
    #[serde(default, rename = "todo_page_size")]
    page_size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_api_key_config() {
        let cfg = ApiConfig::from_json(
            r#"{
                "aws_project_region": "us-east-1",
                "aws_appsync_graphqlEndpoint": "https://example.com/graphql",
                "aws_appsync_authenticationType": "API_KEY",
                "aws_appsync_apiKey": "da2-secret"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.endpoint, "https://example.com/graphql");
        assert_eq!(cfg.auth, AuthMode::ApiKey("da2-secret".to_string()));
        assert_eq!(cfg.page_size, None);
    }

    #[test]
    fn api_key_mode_without_key_is_rejected() {
        let err = ApiConfig::from_json(
            r#"{"aws_appsync_graphqlEndpoint":"http://x","aws_appsync_authenticationType":"API_KEY"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_, "aws_appsync_apiKey")));
    }

    #[test]
    fn missing_endpoint_is_rejected() {
        let err = ApiConfig::from_json(r#"{"aws_appsync_authenticationType":"NONE"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEndpoint));
    }

    #[test]
    fn explicit_endpoint_fills_in_for_file() {
        let raw = r#"{"aws_appsync_authenticationType":"API_KEY","aws_appsync_apiKey":"da2-file"}"#;
        let cfg = ApiConfig::from_json_with_endpoint(raw, Some("http://localhost:3000/graphql")).unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:3000/graphql");
        assert_eq!(cfg.auth, AuthMode::ApiKey("da2-file".to_string()));

        let raw = r#"{"aws_appsync_graphqlEndpoint":"https://file.example/graphql"}"#;
        let cfg = ApiConfig::from_json_with_endpoint(raw, Some("http://override")).unwrap();
        assert_eq!(cfg.endpoint, "http://override");
    }

    #[test]
    fn unknown_auth_type_is_rejected() {
        let err = ApiConfig::from_json(
            r#"{"aws_appsync_graphqlEndpoint":"http://x","aws_appsync_authenticationType":"AWS_IAM"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedAuth(t) if t == "AWS_IAM"));
    }

    #[test]
    fn user_pool_config_starts_without_token() {
        let cfg = ApiConfig::from_json(
            r#"{"aws_appsync_graphqlEndpoint":"http://x","aws_appsync_authenticationType":"AMAZON_COGNITO_USER_POOLS","todo_page_size":25}"#,
        )
        .unwrap();
        assert_eq!(cfg.auth, AuthMode::UserPool(String::new()));
        assert_eq!(cfg.page_size, Some(25));
    }

    #[test]
    fn auth_headers() {
        assert_eq!(AuthMode::None.header(), None);
        assert_eq!(
            AuthMode::ApiKey("k".into()).header(),
            Some(("x-api-key".to_string(), "k".to_string()))
        );
        assert_eq!(
            AuthMode::UserPool("jwt".into()).header(),
            Some(("authorization".to_string(), "jwt".to_string()))
        );
    }
}
