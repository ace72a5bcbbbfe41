//! Slash command capabilities and the registry that routes to them.
//!
//! Each submodule implements one command:
//! - [`climb`]: `/climb` climb lookup with Typesense autocomplete
//! - [`crag`]: `/crag` area lookup with Typesense autocomplete
//!
//! A command exposes a [`CommandHandler`] (full execution producing a
//! webhook message), an [`AutocompleteHandler`], or both. The
//! [`CommandRegistry`] is built once at startup and shared read-only.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use cragbot_core::{OpenBetaApi, SearchIndex};

use crate::error::{Capability, ServerError};
use crate::interaction::{AutocompleteResponse, Interaction, WebhookMessage};

pub mod climb;
pub mod crag;

/// Full command execution.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Produces the message delivered for `interaction`.
    ///
    /// # Errors
    ///
    /// Returns an error if input is missing or an upstream lookup fails.
    async fn handle(&self, interaction: &Interaction) -> Result<WebhookMessage, ServerError>;
}

/// Autocomplete suggestions for the focused option.
#[async_trait]
pub trait AutocompleteHandler: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the search backend fails.
    async fn autocomplete(
        &self,
        interaction: &Interaction,
    ) -> Result<AutocompleteResponse, ServerError>;
}

/// The capabilities registered under one command name.
#[derive(Clone, Default)]
pub struct CommandCapability {
    handler: Option<Arc<dyn CommandHandler>>,
    autocomplete: Option<Arc<dyn AutocompleteHandler>>,
}

impl CommandCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(mut self, handler: Arc<dyn CommandHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_autocomplete(mut self, autocomplete: Arc<dyn AutocompleteHandler>) -> Self {
        self.autocomplete = Some(autocomplete);
        self
    }
}

impl fmt::Debug for CommandCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandCapability")
            .field("handler", &self.handler.is_some())
            .field("autocomplete", &self.autocomplete.is_some())
            .finish()
    }
}

/// Command name to capability lookup.
///
/// # Examples
///
/// ```
/// use cragbot_server::commands::{CommandCapability, CommandRegistry};
/// use cragbot_server::error::ServerError;
///
/// let mut registry = CommandRegistry::new();
/// registry.register("noop", CommandCapability::new());
///
/// assert!(matches!(
///     registry.handler("noop"),
///     Err(ServerError::CapabilityMissing { .. })
/// ));
/// assert!(matches!(
///     registry.handler("boulder"),
///     Err(ServerError::CommandNotFound(_))
/// ));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandCapability>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `/climb` and `/crag` wired to the given backends.
    pub fn with_defaults(openbeta: Arc<dyn OpenBetaApi>, search: Arc<dyn SearchIndex>) -> Self {
        let climb = Arc::new(climb::ClimbCommand::new(
            Arc::clone(&openbeta),
            Arc::clone(&search),
        ));
        let crag = Arc::new(crag::CragCommand::new(openbeta, search));

        let mut registry = Self::new();
        registry.register(
            climb::NAME,
            CommandCapability::new()
                .with_handler(climb.clone())
                .with_autocomplete(climb),
        );
        registry.register(
            crag::NAME,
            CommandCapability::new()
                .with_handler(crag.clone())
                .with_autocomplete(crag),
        );
        registry
    }

    /// Registers `capability` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, capability: CommandCapability) {
        self.commands.insert(name.into(), capability);
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn lookup(&self, name: &str) -> Result<&CommandCapability, ServerError> {
        self.commands
            .get(name)
            .ok_or_else(|| ServerError::CommandNotFound(name.to_string()))
    }

    /// Resolves the full-execution handler for `name`.
    ///
    /// # Errors
    ///
    /// `CommandNotFound` if `name` is not registered, `CapabilityMissing` if
    /// it has no handler.
    pub fn handler(&self, name: &str) -> Result<Arc<dyn CommandHandler>, ServerError> {
        self.lookup(name)?
            .handler
            .clone()
            .ok_or_else(|| ServerError::CapabilityMissing {
                command: name.to_string(),
                capability: Capability::Handler,
            })
    }

    /// Resolves the autocomplete handler for `name`.
    ///
    /// # Errors
    ///
    /// `CommandNotFound` if `name` is not registered, `CapabilityMissing` if
    /// it has no autocomplete.
    pub fn autocomplete(&self, name: &str) -> Result<Arc<dyn AutocompleteHandler>, ServerError> {
        self.lookup(name)?
            .autocomplete
            .clone()
            .ok_or_else(|| ServerError::CapabilityMissing {
                command: name.to_string(),
                capability: Capability::Autocomplete,
            })
    }
}

/// The string value of a required option.
fn required_option<'a>(interaction: &'a Interaction, name: &str) -> Result<&'a str, ServerError> {
    interaction
        .option(name)
        .and_then(|o| o.value_str())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::InvalidInput(format!("missing option '{name}'")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use cragbot_core::openbeta::{Area, Climb};
    use cragbot_core::{CoreError, SearchRequest};

    use super::*;

    /// In-memory OpenBeta lookups.
    #[derive(Debug, Default)]
    pub struct FakeOpenBeta {
        pub climbs: Vec<Climb>,
        pub areas: Vec<Area>,
    }

    #[async_trait]
    impl OpenBetaApi for FakeOpenBeta {
        async fn climb(&self, uuid: &str) -> Result<Climb, CoreError> {
            self.climbs
                .iter()
                .find(|c| c.uuid == uuid)
                .cloned()
                .ok_or_else(|| CoreError::NotFound(format!("climb {uuid}")))
        }

        async fn area(&self, uuid: &str) -> Result<Area, CoreError> {
            self.areas
                .iter()
                .find(|a| a.uuid == uuid)
                .cloned()
                .ok_or_else(|| CoreError::NotFound(format!("area {uuid}")))
        }
    }

    /// Returns canned documents and records every request.
    #[derive(Debug, Default)]
    pub struct FakeSearch {
        pub documents: Vec<serde_json::Value>,
        pub requests: Mutex<Vec<SearchRequest>>,
    }

    impl FakeSearch {
        pub fn with_documents(documents: Vec<serde_json::Value>) -> Self {
            Self {
                documents,
                ..Self::default()
            }
        }

        pub fn requests(&self) -> Vec<SearchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchIndex for FakeSearch {
        async fn search(
            &self,
            request: &SearchRequest,
        ) -> Result<Vec<serde_json::Value>, CoreError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.documents.clone())
        }
    }

    /// Interaction with the given command name and options.
    pub fn interaction(kind: u8, command: &str, options: serde_json::Value) -> Interaction {
        serde_json::from_value(serde_json::json!({
            "type": kind,
            "id": "1",
            "application_id": "42",
            "token": "tok",
            "data": { "name": command, "options": options }
        }))
        .unwrap()
    }
}
