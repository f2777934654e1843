//! Resolve the API configuration from flags, environment and config file.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use todo_core::{ApiConfig, AuthMode};

/// Connection options as given on the command line (or via env).
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConnectionArgs {
    /// GraphQL endpoint URL. Overrides the config file.
    #[arg(long, env = "TODO_API_URL")]
    pub endpoint: Option<String>,

    /// API key sent as `x-api-key`. Overrides the config file.
    #[arg(long, env = "TODO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Bearer token for user-pool authorization.
    #[arg(long, env = "TODO_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Backend JSON config with `aws_appsync_*` keys.
    #[arg(long, env = "TODO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Items requested per list page.
    #[arg(long)]
    pub page_size: Option<u32>,
}

impl ConnectionArgs {
    /// Flags win over the file; the file is only required when no endpoint
    /// is given.
    pub fn resolve(&self) -> Result<ApiConfig> {
        let mut config = match (&self.config, &self.endpoint) {
            (Some(path), endpoint) => ApiConfig::load_with_endpoint(path, endpoint.as_deref())
                .with_context(|| format!("loading {}", path.display()))?,
            (None, Some(endpoint)) => ApiConfig::new(endpoint.clone()),
            (None, None) => bail!("no endpoint: pass --endpoint, set TODO_API_URL, or use --config"),
        };

        if let Some(key) = &self.api_key {
            config.auth = AuthMode::ApiKey(key.clone());
        } else if let Some(token) = &self.token {
            config.auth = AuthMode::UserPool(token.clone());
        }
        if let Some(size) = self.page_size {
            config = config.with_page_size(size);
        }

        if matches!(&config.auth, AuthMode::UserPool(t) if t.is_empty()) {
            bail!("user-pool authorization needs a token: pass --token or set TODO_API_TOKEN");
        }
        Ok(config)
    }
}
