//! Server configuration types and loading.
//!
//! Defines [`ServerConfig`] which is loaded from `~/.cragbot/config.yml`
//! (or the path in `CRAGBOT_CONFIG`). Contains the Discord application
//! credentials, upstream data endpoints, and HTTP server settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cragbot_core::TypesenseConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dispatch::RouterConfig;
use crate::error::ServerError;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "CRAGBOT_CONFIG";

const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Top-level server configuration.
///
/// # Examples
///
/// ```
/// use cragbot_server::config::ServerConfig;
///
/// let yaml = r#"
/// discord:
///   application_id: "1049383523034"
///   public_key: "8d3b0b1e8a6b6d0c3f6c0b1e8a6b6d0c3f6c0b1e8a6b6d0c3f6c0b1e8a6b6d0c"
///   bot_token: "bot-token"
/// typesense:
///   host: "search.example.net"
///   api_key: "search-only"
/// "#;
///
/// let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(config.discord.api_base, "https://discord.com/api/v10");
/// assert_eq!(config.server.interactions_path, "/interactions");
/// assert!(!config.server.offline);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Discord application credentials.
    pub discord: DiscordConfig,

    /// OpenBeta GraphQL endpoint.
    #[serde(default)]
    pub openbeta: OpenBetaConfig,

    /// Typesense search cluster used by autocomplete.
    pub typesense: TypesenseConfig,

    /// HTTP server and interaction lifecycle settings.
    #[serde(default)]
    pub server: HttpConfig,
}

/// Discord application credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Application (client) ID, used to build interaction webhook URLs.
    pub application_id: String,

    /// Hex-encoded Ed25519 public key for request signature checks.
    pub public_key: String,

    /// Bot token for authenticated REST calls (healthcheck).
    pub bot_token: String,

    /// REST API base URL.
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
}

fn default_discord_api_base() -> String {
    DEFAULT_DISCORD_API_BASE.to_string()
}

/// OpenBeta GraphQL settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenBetaConfig {
    #[serde(default = "default_openbeta_endpoint")]
    pub endpoint: String,
}

impl Default for OpenBetaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_openbeta_endpoint(),
        }
    }
}

fn default_openbeta_endpoint() -> String {
    cragbot_core::openbeta::DEFAULT_ENDPOINT.to_string()
}

/// Deployment environment. Controls how much error detail reaches callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

/// HTTP server and interaction lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Socket address to bind.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Route that receives Discord interactions.
    #[serde(default = "default_interactions_path")]
    pub interactions_path: String,

    /// Externally reachable URL of the interactions endpoint, used as the
    /// re-dispatch target. Derived from the `Host` header when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,

    #[serde(default)]
    pub environment: Environment,

    /// Local/offline runtime that cannot serve overlapping requests; the
    /// re-dispatch is then fire-and-forget instead of awaited.
    #[serde(default)]
    pub offline: bool,

    /// Budget for a deferred command before the timeout message is sent.
    #[serde(default = "default_execution_timeout_secs")]
    pub execution_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            interactions_path: default_interactions_path(),
            public_url: None,
            environment: Environment::default(),
            offline: false,
            execution_timeout_secs: default_execution_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_interactions_path() -> String {
    "/interactions".to_string()
}

fn default_execution_timeout_secs() -> u64 {
    29
}

/// Returns the default configuration directory path (`~/.cragbot/`).
///
/// # Errors
///
/// Returns `ServerError::Config` if the `HOME` environment variable is not set.
pub fn default_config_dir() -> Result<PathBuf, ServerError> {
    let home = std::env::var("HOME")
        .map_err(|_| ServerError::Config("HOME environment variable not set".into()))?;
    Ok(PathBuf::from(home).join(".cragbot"))
}

/// Returns the configuration file path: `$CRAGBOT_CONFIG` if set, otherwise
/// `~/.cragbot/config.yml`.
///
/// # Errors
///
/// Returns `ServerError::Config` if neither `CRAGBOT_CONFIG` nor `HOME` is set.
pub fn config_path() -> Result<PathBuf, ServerError> {
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(default_config_dir()?.join("config.yml")),
    }
}

impl ServerConfig {
    /// Loads configuration from the given YAML file path.
    ///
    /// Validates credentials and server settings after loading.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the file cannot be read, contains
    /// invalid YAML, or has invalid values.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        info!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("Cannot read config at {}: {e}", path.display()))
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            ServerError::Config(format!("Invalid YAML in config at {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Router settings derived from the server section.
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            await_redispatch: !self.server.offline,
            execution_timeout: Duration::from_secs(self.server.execution_timeout_secs),
            ..RouterConfig::default()
        }
    }

    fn validate(&self) -> Result<(), ServerError> {
        if self.discord.application_id.is_empty() {
            return Err(ServerError::Config(
                "discord.application_id must not be empty".into(),
            ));
        }
        if self.discord.bot_token.is_empty() {
            return Err(ServerError::Config(
                "discord.bot_token must not be empty".into(),
            ));
        }
        let key = &self.discord.public_key;
        if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ServerError::Config(
                "discord.public_key must be 64 hex characters".into(),
            ));
        }
        if self.typesense.host.is_empty() || self.typesense.api_key.is_empty() {
            return Err(ServerError::Config(
                "typesense.host and typesense.api_key must not be empty".into(),
            ));
        }
        if !self.server.interactions_path.starts_with('/') {
            return Err(ServerError::Config(
                "server.interactions_path must start with '/'".into(),
            ));
        }
        if self.server.execution_timeout_secs == 0 {
            return Err(ServerError::Config(
                "server.execution_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
