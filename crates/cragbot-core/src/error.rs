//! Error types for the core crate.
//!
//! Defines `CoreError` as the primary error type for all operations
//! within `cragbot-core`.

use thiserror::Error;

/// Error type for cragbot-core operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// Transport-level failure talking to an upstream HTTP service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The GraphQL endpoint answered with an `errors` array or no data.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// The search index rejected a query or returned a malformed result.
    #[error("Search error: {0}")]
    Search(String),

    /// The requested record does not exist upstream.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
