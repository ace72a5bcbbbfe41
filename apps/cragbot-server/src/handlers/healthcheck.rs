//! `GET /healthcheck`: reports how many guilds the bot is installed in.

use std::sync::Arc;

use axum::extract::State;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthcheckResponse {
    pub num_guilds: usize,
}

#[instrument(skip_all)]
pub async fn handle_healthcheck(State(state): State<Arc<AppState>>) -> ApiResponse {
    let result = state.discord().all_guilds().await.and_then(|guilds| {
        info!(num_guilds = guilds.len(), "Healthcheck");
        ApiResponse::json(&HealthcheckResponse {
            num_guilds: guilds.len(),
        })
    });

    result.unwrap_or_else(|e| {
        error!(error = %e, "Healthcheck failed");
        ApiResponse::internal_error(&e, state.environment())
    })
}
