//! Discord interaction wire types.
//!
//! [`Interaction`] is the decoded inbound payload. Fields the bot does not
//! read are kept in `extra` maps so an interaction re-serializes without
//! losing data. Response payloads ([`InteractionResponse`],
//! [`AutocompleteResponse`], [`WebhookMessage`]) are the bodies sent back to
//! Discord, either inline or through the interaction webhook.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::embed::Embed;

/// Interaction kind, as carried in the payload's numeric `type` field.
///
/// # Examples
///
/// ```
/// use cragbot_server::interaction::InteractionType;
///
/// assert_eq!(InteractionType::from(4), InteractionType::ApplicationCommandAutocomplete);
/// assert_eq!(u8::from(InteractionType::Unknown(42)), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    ApplicationCommandAutocomplete,
    ModalSubmit,
    Unknown(u8),
}

impl From<u8> for InteractionType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            4 => Self::ApplicationCommandAutocomplete,
            5 => Self::ModalSubmit,
            other => Self::Unknown(other),
        }
    }
}

impl From<InteractionType> for u8 {
    fn from(value: InteractionType) -> Self {
        match value {
            InteractionType::Ping => 1,
            InteractionType::ApplicationCommand => 2,
            InteractionType::MessageComponent => 3,
            InteractionType::ApplicationCommandAutocomplete => 4,
            InteractionType::ModalSubmit => 5,
            InteractionType::Unknown(other) => other,
        }
    }
}

/// A decoded Discord interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: InteractionType,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,

    /// One-time credential for the interaction webhook.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionData>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Command payload of an application command or autocomplete interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<CommandOption>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One option value supplied by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Set on the option the user is typing into during autocomplete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused: Option<bool>,

    /// Nested options for subcommands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<CommandOption>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CommandOption {
    pub fn is_focused(&self) -> bool {
        self.focused.unwrap_or(false)
    }

    /// The option value if it is a string.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }
}

impl Interaction {
    /// The invoked command's name, if the interaction carries command data.
    pub fn command_name(&self) -> Option<&str> {
        self.data
            .as_ref()
            .map(|d| d.name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Top-level options in the order the user supplied them.
    pub fn options(&self) -> &[CommandOption] {
        self.data
            .as_ref()
            .and_then(|d| d.options.as_deref())
            .unwrap_or(&[])
    }

    /// Looks up a top-level option by name.
    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        self.options().iter().find(|o| o.name == name)
    }

    /// The option marked `focused` during autocomplete.
    pub fn focused_option(&self) -> Option<&CommandOption> {
        self.options().iter().find(|o| o.is_focused())
    }
}

/// Interaction callback type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum InteractionResponseType {
    Pong,
    ChannelMessageWithSource,
    DeferredChannelMessageWithSource,
    DeferredUpdateMessage,
    UpdateMessage,
    ApplicationCommandAutocompleteResult,
    Modal,
}

impl From<InteractionResponseType> for u8 {
    fn from(value: InteractionResponseType) -> Self {
        match value {
            InteractionResponseType::Pong => 1,
            InteractionResponseType::ChannelMessageWithSource => 4,
            InteractionResponseType::DeferredChannelMessageWithSource => 5,
            InteractionResponseType::DeferredUpdateMessage => 6,
            InteractionResponseType::UpdateMessage => 7,
            InteractionResponseType::ApplicationCommandAutocompleteResult => 8,
            InteractionResponseType::Modal => 9,
        }
    }
}

impl TryFrom<u8> for InteractionResponseType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Pong),
            4 => Ok(Self::ChannelMessageWithSource),
            5 => Ok(Self::DeferredChannelMessageWithSource),
            6 => Ok(Self::DeferredUpdateMessage),
            7 => Ok(Self::UpdateMessage),
            8 => Ok(Self::ApplicationCommandAutocompleteResult),
            9 => Ok(Self::Modal),
            other => Err(format!("unknown interaction response type {other}")),
        }
    }
}

/// A response body without message data (pong, deferred acknowledgement).
///
/// # Examples
///
/// ```
/// use cragbot_server::interaction::InteractionResponse;
///
/// let pong = serde_json::to_string(&InteractionResponse::pong()).unwrap();
/// assert_eq!(pong, r#"{"type":1}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: InteractionResponseType,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: InteractionResponseType::Pong,
        }
    }

    /// "Thinking..." acknowledgement; the real message follows via webhook.
    pub fn deferred_channel_message() -> Self {
        Self {
            kind: InteractionResponseType::DeferredChannelMessageWithSource,
        }
    }
}

/// A single autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteData {
    pub choices: Vec<AutocompleteChoice>,
}

/// Body returned inline for autocomplete interactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    #[serde(rename = "type")]
    pub kind: InteractionResponseType,
    pub data: AutocompleteData,
}

impl AutocompleteResponse {
    pub fn new(choices: Vec<AutocompleteChoice>) -> Self {
        Self {
            kind: InteractionResponseType::ApplicationCommandAutocompleteResult,
            data: AutocompleteData { choices },
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

/// Message body posted to the interaction webhook.
///
/// # Examples
///
/// ```
/// use cragbot_server::interaction::WebhookMessage;
///
/// let json = serde_json::to_value(WebhookMessage::text("Response Timeout")).unwrap();
/// assert_eq!(json, serde_json::json!({"content": "Response Timeout"}));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl WebhookMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn autocomplete_json() -> Value {
        serde_json::json!({
            "type": 4,
            "id": "1100",
            "application_id": "42",
            "token": "tok",
            "version": 1,
            "guild_id": "77",
            "member": { "user": { "id": "5", "username": "alex" } },
            "data": {
                "id": "900",
                "name": "crag",
                "type": 1,
                "options": [
                    { "name": "name", "type": 3, "value": "smith", "focused": true }
                ]
            }
        })
    }

    #[test]
    fn test_should_deserialize_autocomplete_interaction() {
        let interaction: Interaction = serde_json::from_value(autocomplete_json()).unwrap();
        assert_eq!(interaction.kind, InteractionType::ApplicationCommandAutocomplete);
        assert_eq!(interaction.command_name(), Some("crag"));
        let focused = interaction.focused_option().expect("focused");
        assert_eq!(focused.name, "name");
        assert_eq!(focused.value_str(), Some("smith"));
    }

    #[test]
    fn test_should_preserve_unknown_fields_when_reserialized() {
        let original = autocomplete_json();
        let interaction: Interaction = serde_json::from_value(original.clone()).unwrap();
        let reserialized = serde_json::to_value(&interaction).unwrap();
        assert_eq!(reserialized, original);
    }

    #[test]
    fn test_should_preserve_empty_options_array() {
        let original = serde_json::json!({
            "type": 2, "id": "1", "token": "t",
            "data": { "name": "climb", "options": [] }
        });
        let interaction: Interaction = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&interaction).unwrap(), original);
    }

    #[test]
    fn test_should_deserialize_minimal_ping() {
        let interaction: Interaction = serde_json::from_str(r#"{"type":1}"#).unwrap();
        assert_eq!(interaction.kind, InteractionType::Ping);
        assert!(interaction.command_name().is_none());
        assert!(interaction.options().is_empty());
    }

    #[test]
    fn test_should_keep_unknown_interaction_type() {
        let interaction: Interaction =
            serde_json::from_str(r#"{"type":12,"id":"1","token":"t"}"#).unwrap();
        assert_eq!(interaction.kind, InteractionType::Unknown(12));
    }

    #[test]
    fn test_should_find_option_without_focus() {
        let interaction: Interaction = serde_json::from_value(serde_json::json!({
            "type": 2, "id": "1", "token": "t",
            "data": { "name": "climb", "options": [{ "name": "name", "type": 3, "value": "uuid-1" }] }
        }))
        .unwrap();
        assert!(interaction.focused_option().is_none());
        assert_eq!(
            interaction.option("name").and_then(CommandOption::value_str),
            Some("uuid-1")
        );
    }

    #[test]
    fn test_should_serialize_deferred_ack() {
        let json = serde_json::to_string(&InteractionResponse::deferred_channel_message()).unwrap();
        assert_eq!(json, r#"{"type":5}"#);
    }

    #[test]
    fn test_should_serialize_autocomplete_response() {
        let response = AutocompleteResponse::new(vec![AutocompleteChoice {
            name: "Smith Rock (Oregon) (1800 climbs)".into(),
            value: "a-1".into(),
        }]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], 8);
        assert_eq!(json["data"]["choices"][0]["value"], "a-1");
    }

    #[test]
    fn test_should_reject_unknown_response_type() {
        let result = serde_json::from_str::<InteractionResponse>(r#"{"type":2}"#);
        assert!(result.is_err());
    }
}
