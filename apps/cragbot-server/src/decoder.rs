//! Inbound interaction decoding.
//!
//! [`decode`] runs the checks every webhook request must pass before the
//! router sees it: signature headers present, body present, Ed25519
//! signature valid over the raw bytes, then JSON parse. Ping interactions are
//! answered here and never reach dispatch.
//!
//! Every short-circuit is returned as an [`ApiResponse`] so the HTTP layer
//! can forward it unchanged.

use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, warn};

use crate::interaction::{Interaction, InteractionType};
use crate::response::ApiResponse;
use crate::signature;

/// Signature header as Discord documents it.
pub const HEADER_SIGNATURE: &str = "X-Signature-Ed25519";

/// Timestamp header as Discord documents it.
pub const HEADER_TIMESTAMP: &str = "X-Signature-Timestamp";

/// Reads a header as UTF-8. `HeaderMap` lookups ignore case.
fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Verifies and parses an inbound interaction.
///
/// Returns `Err` with the response to send when the request is rejected or,
/// for a Ping, already answered.
///
/// # Errors
///
/// - 401 `X-Signature-Ed25519 Missing` / `X-Signature-Timestamp Missing`
/// - 401 `Body Missing`
/// - 401 `invalid request signature`
/// - 400 `invalid interaction payload` for a signed body that is not an interaction
/// - 200 `{"type":1}` for a Ping
pub fn decode(
    headers: &HeaderMap,
    raw_body: &[u8],
    public_key: &str,
) -> Result<Interaction, ApiResponse> {
    let Some(signature) = header(headers, HEADER_SIGNATURE) else {
        return Err(ApiResponse::unauthorized(format!("{HEADER_SIGNATURE} Missing")));
    };
    let Some(timestamp) = header(headers, HEADER_TIMESTAMP) else {
        return Err(ApiResponse::unauthorized(format!("{HEADER_TIMESTAMP} Missing")));
    };
    if raw_body.is_empty() {
        return Err(ApiResponse::unauthorized("Body Missing"));
    }

    if !signature::verify(raw_body, signature, timestamp, public_key) {
        warn!("Rejecting interaction with invalid signature");
        return Err(ApiResponse::unauthorized("invalid request signature"));
    }

    let interaction: Interaction = serde_json::from_slice(raw_body).map_err(|e| {
        warn!(error = %e, "Signed body is not a valid interaction");
        ApiResponse::new(StatusCode::BAD_REQUEST, "invalid interaction payload")
    })?;

    debug!(
        interaction_id = %interaction.id,
        interaction_type = u8::from(interaction.kind),
        command = interaction.command_name().unwrap_or(""),
        "Decoded interaction",
    );

    if interaction.kind == InteractionType::Ping {
        return Err(ApiResponse::ok(PONG_BODY));
    }

    Ok(interaction)
}

/// Serialized `InteractionResponse::pong()`.
const PONG_BODY: &str = r#"{"type":1}"#;
