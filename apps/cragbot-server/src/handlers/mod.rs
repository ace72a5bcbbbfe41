//! HTTP route handlers.
//!
//! - [`interactions`]: the Discord interactions webhook
//! - [`healthcheck`]: liveness plus a guild count

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

pub mod healthcheck;
pub mod interactions;

/// Builds the axum router for all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(state.interactions_path(), post(interactions::handle_interaction))
        .route("/healthcheck", get(healthcheck::handle_healthcheck))
        .with_state(state)
}
