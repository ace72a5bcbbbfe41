//! Shared application state for cragbot-server.
//!
//! [`AppState`] is the state container passed (as `Arc<AppState>`) to every
//! axum handler. It is built once in `main` and never mutated.

use axum::http::HeaderMap;
use axum::http::header::HOST;

use crate::config::{Environment, ServerConfig};
use crate::discord_client::DiscordClient;
use crate::dispatch::InteractionRouter;

/// Shared application state, passed as `Arc<AppState>` to all handlers.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cragbot_server::commands::CommandRegistry;
/// use cragbot_server::config::Environment;
/// use cragbot_server::discord_client::DiscordClient;
/// use cragbot_server::dispatch::{InteractionRouter, RouterConfig};
/// use cragbot_server::redispatch::HttpRedispatcher;
/// use cragbot_server::state::AppState;
///
/// let discord = DiscordClient::new("https://discord.com/api/v10", "42", "bot-token");
/// let router = InteractionRouter::new(
///     Arc::new(CommandRegistry::new()),
///     Arc::new(HttpRedispatcher::new()),
///     Arc::new(discord.clone()),
///     RouterConfig::default(),
/// );
/// let state = AppState::new(router, discord, "ab".repeat(32), Environment::Production);
/// assert_eq!(state.interactions_path(), "/interactions");
/// ```
#[derive(Debug)]
pub struct AppState {
    router: InteractionRouter,
    discord: DiscordClient,
    public_key: String,
    environment: Environment,
    public_url: Option<String>,
    interactions_path: String,
}

impl AppState {
    pub fn new(
        router: InteractionRouter,
        discord: DiscordClient,
        public_key: String,
        environment: Environment,
    ) -> Self {
        Self {
            router,
            discord,
            public_key,
            environment,
            public_url: None,
            interactions_path: "/interactions".to_string(),
        }
    }

    /// Builds state from loaded configuration and constructed collaborators.
    pub fn from_config(
        config: &ServerConfig,
        router: InteractionRouter,
        discord: DiscordClient,
    ) -> Self {
        Self::new(
            router,
            discord,
            config.discord.public_key.clone(),
            config.server.environment,
        )
        .with_public_url(config.server.public_url.clone())
        .with_interactions_path(config.server.interactions_path.clone())
    }

    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url;
        self
    }

    pub fn with_interactions_path(mut self, path: String) -> Self {
        self.interactions_path = path;
        self
    }

    /// Returns the interaction router.
    pub fn router(&self) -> &InteractionRouter {
        &self.router
    }

    /// Returns the Discord REST client.
    pub fn discord(&self) -> &DiscordClient {
        &self.discord
    }

    /// Hex-encoded Ed25519 key that inbound requests are verified against.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn interactions_path(&self) -> &str {
        &self.interactions_path
    }

    /// Where the deferred phase of a request received with `headers` is sent.
    ///
    /// The configured public URL wins; otherwise the URL is rebuilt from the
    /// `Host` header as `https://{host}{interactions_path}`.
    pub fn redispatch_url(&self, headers: &HeaderMap) -> Option<String> {
        if let Some(url) = &self.public_url {
            return Some(url.clone());
        }
        let host = headers.get(HOST)?.to_str().ok()?;
        Some(format!("https://{host}{}", self.interactions_path))
    }
}
