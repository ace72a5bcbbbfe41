//! cragbot server: Discord interactions webhook for OpenBeta lookups.
//!
//! Loads `~/.cragbot/config.yml` (or `$CRAGBOT_CONFIG`), builds the upstream
//! clients once, and serves the interactions endpoint until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use cragbot_core::{DefaultOpenBeta, TypesenseClient};
use cragbot_server::commands::CommandRegistry;
use cragbot_server::config::{self, ServerConfig};
use cragbot_server::discord_client::DiscordClient;
use cragbot_server::dispatch::InteractionRouter;
use cragbot_server::handlers;
use cragbot_server::redispatch::HttpRedispatcher;
use cragbot_server::state::AppState;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cragbot_server=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = config::config_path().context("Failed to determine config path")?;
    let server_config = ServerConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!(
        environment = ?server_config.server.environment,
        offline = server_config.server.offline,
        "Configuration loaded successfully"
    );

    // Build collaborators
    let openbeta = Arc::new(DefaultOpenBeta::new(server_config.openbeta.endpoint.clone()));
    let search = Arc::new(
        TypesenseClient::new(server_config.typesense.clone())
            .context("Failed to build Typesense client")?,
    );
    let registry = Arc::new(CommandRegistry::with_defaults(openbeta, search));
    let discord = DiscordClient::from_config(&server_config.discord);
    let router = InteractionRouter::new(
        Arc::clone(&registry),
        Arc::new(HttpRedispatcher::new()),
        Arc::new(discord.clone()),
        server_config.router_config(),
    );
    let app_state = Arc::new(AppState::from_config(&server_config, router, discord));

    info!(
        commands = ?registry.names(),
        path = app_state.interactions_path(),
        "Application state initialized"
    );

    let listener = tokio::net::TcpListener::bind(&server_config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", server_config.server.listen_addr))?;
    info!(addr = %server_config.server.listen_addr, "Listening for interactions");

    axum::serve(listener, handlers::router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shut down cleanly");
    Ok(())
}

/// Resolves on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    () = ctrl_c => info!("Received SIGINT, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c.await;
                info!("Received SIGINT, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        info!("Received SIGINT, shutting down...");
    }
}
