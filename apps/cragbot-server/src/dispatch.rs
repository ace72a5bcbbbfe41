//! Interaction routing and the deferred execution protocol.
//!
//! Autocomplete interactions are answered inline. Full commands go through
//! two invocations of the same endpoint:
//!
//! 1. **Fresh**: resolve the handler, re-dispatch the signed request to
//!    ourselves with `x-deferred: true`, and acknowledge Discord with a
//!    deferred channel message (`{"type":5}`).
//! 2. **Deferred**: race the handler against the execution timeout and post
//!    whatever settles first to the interaction webhook.
//!
//! Discord expects the initial acknowledgement within 3 seconds and the
//! hosting runtime cuts a request off shortly after 29, so the command never
//! runs on the fresh invocation.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::HeaderMap;
use tracing::{debug, info, instrument, warn};

use crate::callback::{self, InteractionWebhook};
use crate::commands::CommandRegistry;
use crate::error::ServerError;
use crate::interaction::{
    AutocompleteResponse, Interaction, InteractionResponse, InteractionType, WebhookMessage,
};
use crate::race::{Settled, first_settle};
use crate::redispatch::{DeferredEnvelope, Redispatcher, is_deferred};
use crate::response::ApiResponse;

/// Delivered when the handler does not settle within the execution timeout.
pub const TIMEOUT_MESSAGE: &str = "Response Timeout";

/// Delivered when the handler fails.
pub const ERROR_MESSAGE: &str = "Something went wrong while running this command.";

/// Body returned by the deferred invocation once delivery is done.
pub const DEFERRED_OK_BODY: &str = "OK";

/// Router behaviour that differs between deployments.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cragbot_server::dispatch::RouterConfig;
///
/// let config = RouterConfig::default();
/// assert!(config.await_redispatch);
/// assert_eq!(config.execution_timeout, Duration::from_secs(29));
/// assert_eq!(config.redispatch_accept_window, Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Await the re-dispatch before acknowledging. Disable on runtimes that
    /// serve one request at a time, where awaiting would deadlock.
    pub await_redispatch: bool,

    /// Upper bound on how long an awaited re-dispatch holds the
    /// acknowledgement. The deferred invocation only answers once the
    /// command has finished, so a re-dispatch still in flight when the
    /// window closes counts as accepted and keeps running.
    pub redispatch_accept_window: Duration,

    /// How long the deferred phase waits for the handler.
    pub execution_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            await_redispatch: true,
            redispatch_accept_window: Duration::from_secs(2),
            execution_timeout: Duration::from_secs(29),
        }
    }
}

/// Which invocation of a full command this request is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fresh,
    Deferred,
}

impl Phase {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if is_deferred(headers) {
            Self::Deferred
        } else {
            Self::Fresh
        }
    }
}

/// The transport-level view of a verified request, needed to re-dispatch it.
#[derive(Debug, Clone)]
pub struct InboundInteraction {
    pub headers: HeaderMap,
    pub raw_body: Bytes,
    /// Where to re-dispatch; `None` if it cannot be determined.
    pub redispatch_url: Option<String>,
}

/// Routes decoded interactions to command capabilities.
#[derive(Clone)]
pub struct InteractionRouter {
    registry: Arc<CommandRegistry>,
    redispatcher: Arc<dyn Redispatcher>,
    webhook: Arc<dyn InteractionWebhook>,
    config: RouterConfig,
}

impl std::fmt::Debug for InteractionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionRouter")
            .field("commands", &self.registry.names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl InteractionRouter {
    pub fn new(
        registry: Arc<CommandRegistry>,
        redispatcher: Arc<dyn Redispatcher>,
        webhook: Arc<dyn InteractionWebhook>,
        config: RouterConfig,
    ) -> Self {
        Self {
            registry,
            redispatcher,
            webhook,
            config,
        }
    }

    pub fn config(&self) -> RouterConfig {
        self.config
    }

    /// Routes one interaction and returns the HTTP response for it.
    ///
    /// # Errors
    ///
    /// `CommandNotFound` / `CapabilityMissing` when the command cannot serve
    /// the interaction, `UnhandledInteraction` for interaction types other
    /// than commands and autocomplete, and any autocomplete failure.
    #[instrument(
        skip_all,
        fields(
            interaction_id = %interaction.id,
            command = interaction.command_name().unwrap_or_default(),
        )
    )]
    pub async fn route(
        &self,
        inbound: &InboundInteraction,
        interaction: Interaction,
    ) -> Result<ApiResponse, ServerError> {
        match interaction.kind {
            InteractionType::ApplicationCommandAutocomplete => {
                self.autocomplete(&interaction).await
            }
            InteractionType::ApplicationCommand => match Phase::from_headers(&inbound.headers) {
                Phase::Fresh => self.defer(inbound, &interaction).await,
                Phase::Deferred => self.execute(interaction).await,
            },
            other => Err(ServerError::UnhandledInteraction(u8::from(other))),
        }
    }

    async fn autocomplete(&self, interaction: &Interaction) -> Result<ApiResponse, ServerError> {
        let name = command_name(interaction);
        let autocomplete = self.registry.autocomplete(name)?;
        let response: AutocompleteResponse = autocomplete.autocomplete(interaction).await?;
        debug!(choices = response.data.choices.len(), "Answering autocomplete");
        ApiResponse::json(&response)
    }

    /// Fresh phase: hand the command to a deferred invocation and
    /// acknowledge.
    async fn defer(
        &self,
        inbound: &InboundInteraction,
        interaction: &Interaction,
    ) -> Result<ApiResponse, ServerError> {
        // Fail before acknowledging if nothing can run the command.
        self.registry.handler(command_name(interaction))?;

        match &inbound.redispatch_url {
            Some(url) => {
                let envelope =
                    DeferredEnvelope::new(url.clone(), &inbound.headers, inbound.raw_body.clone());
                self.send_redispatch(envelope).await;
            }
            None => warn!("No re-dispatch URL for request; deferred phase will not run"),
        }

        ApiResponse::json(&InteractionResponse::deferred_channel_message())
    }

    async fn send_redispatch(&self, envelope: DeferredEnvelope) {
        let redispatcher = Arc::clone(&self.redispatcher);
        let send = async move {
            if let Err(e) = redispatcher.redispatch(envelope).await {
                warn!(error = %e, "Re-dispatch failed");
            }
        };

        if !self.config.await_redispatch {
            tokio::spawn(send);
            return;
        }

        match first_settle(send, self.config.redispatch_accept_window).await {
            Ok(Settled::Completed(())) => {}
            Ok(Settled::TimedOut) => debug!(
                window_ms = self.config.redispatch_accept_window.as_millis() as u64,
                "Re-dispatch still in flight, acknowledging"
            ),
            Err(e) => warn!(error = %e, "Re-dispatch task failed"),
        }
    }

    /// Deferred phase: run the handler under the timeout and deliver the
    /// outcome through the interaction webhook.
    async fn execute(&self, interaction: Interaction) -> Result<ApiResponse, ServerError> {
        let handler = self.registry.handler(command_name(&interaction))?;
        let token = interaction.token.clone();

        let settled = first_settle(
            async move { handler.handle(&interaction).await },
            self.config.execution_timeout,
        )
        .await;

        let message = match settled {
            Ok(Settled::Completed(Ok(message))) => message,
            Ok(Settled::Completed(Err(e))) => {
                warn!(error = %e, "Command failed");
                WebhookMessage::text(ERROR_MESSAGE)
            }
            Ok(Settled::TimedOut) => {
                info!(
                    timeout_secs = self.config.execution_timeout.as_secs(),
                    "Command timed out"
                );
                WebhookMessage::text(TIMEOUT_MESSAGE)
            }
            Err(e) => {
                warn!(error = %e, "Command task failed");
                WebhookMessage::text(ERROR_MESSAGE)
            }
        };

        callback::deliver(self.webhook.as_ref(), &token, &message).await;
        Ok(ApiResponse::ok(DEFERRED_OK_BODY))
    }
}

fn command_name(interaction: &Interaction) -> &str {
    interaction.command_name().unwrap_or_default()
}
