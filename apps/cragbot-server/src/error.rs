//! Error types for the cragbot-server application.
//!
//! Defines [`ServerError`] as the primary error type for all operations
//! within `cragbot-server`. Uses `thiserror` for ergonomic error definitions
//! following the project convention.

use std::fmt;

use thiserror::Error;

/// A capability a command may expose to the dispatch router.
///
/// # Examples
///
/// ```
/// use cragbot_server::error::Capability;
///
/// assert_eq!(Capability::Autocomplete.to_string(), "autocomplete");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Full command execution producing a message.
    Handler,
    /// Autocomplete suggestions for a focused option.
    Autocomplete,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler => f.write_str("handler"),
            Self::Autocomplete => f.write_str("autocomplete"),
        }
    }
}

/// Error type for cragbot-server operations.
///
/// Variants are grouped by subsystem: configuration, Discord API
/// communication, re-dispatch transport, command routing, command input,
/// I/O, and serialization.
///
/// # Examples
///
/// ```
/// use cragbot_server::error::ServerError;
///
/// let err = ServerError::CommandNotFound("boulder".into());
/// assert!(err.to_string().contains("boulder"));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    /// A configuration error (missing or invalid config file/values).
    #[error("Config error: {0}")]
    Config(String),

    /// An error from a Discord REST API call.
    #[error("Discord API error: {0}")]
    DiscordApi(String),

    /// The deferred re-dispatch call to our own endpoint failed.
    #[error("Re-dispatch error: {0}")]
    Redispatch(String),

    /// No command is registered under the interaction's command name.
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// The command exists but does not implement the required capability.
    #[error("Command '{command}' has no {capability}")]
    CapabilityMissing {
        command: String,
        capability: Capability,
    },

    /// The interaction type is not one the router handles.
    #[error("Not Handled: interaction type {0}")]
    UnhandledInteraction(u8),

    /// The interaction is missing an option or value a command requires.
    #[error("Invalid command input: {0}")]
    InvalidInput(String),

    /// A spawned command task panicked or was aborted.
    #[error("Command task failed: {0}")]
    Task(String),

    /// An I/O error from file system or socket operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An error from `cragbot-core`.
    #[error(transparent)]
    Core(#[from] cragbot_core::CoreError),
}
