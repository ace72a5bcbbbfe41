//! Discord interactions webhook.
//!
//! Verifies and decodes the request, then hands it to the
//! [`InteractionRouter`](crate::dispatch::InteractionRouter). Errors that
//! escape routing become a 500 whose body depends on the environment.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use tracing::{error, info, instrument};

use crate::decoder;
use crate::dispatch::{InboundInteraction, Phase};
use crate::response::ApiResponse;
use crate::state::AppState;

/// `POST {interactions_path}`.
#[instrument(skip_all, fields(phase))]
pub async fn handle_interaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    let interaction = match decoder::decode(&headers, &body, state.public_key()) {
        Ok(interaction) => interaction,
        Err(response) => return response,
    };

    let phase = Phase::from_headers(&headers);
    tracing::Span::current().record("phase", tracing::field::debug(phase));
    info!(
        interaction_id = %interaction.id,
        command = interaction.command_name().unwrap_or_default(),
        "Received interaction"
    );

    let inbound = InboundInteraction {
        redispatch_url: state.redispatch_url(&headers),
        headers,
        raw_body: body,
    };

    match state.router().route(&inbound, interaction).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Interaction failed");
            ApiResponse::internal_error(&e, state.environment())
        }
    }
}
