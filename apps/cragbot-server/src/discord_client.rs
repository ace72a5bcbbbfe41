//! Thin async client for the Discord REST endpoints cragbot uses.
//!
//! Wraps `reqwest::Client` with the application id and bot token. The
//! interaction webhook is addressed by application id plus the per-interaction
//! token and needs no bot authorization; guild listing uses the bot token.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::callback::InteractionWebhook;
use crate::config::DiscordConfig;
use crate::error::ServerError;
use crate::interaction::WebhookMessage;

/// Largest page `users/@me/guilds` returns.
pub const GUILDS_PAGE_SIZE: usize = 200;

/// Thin async client for the Discord REST API.
///
/// # Examples
///
/// ```
/// use cragbot_server::discord_client::DiscordClient;
///
/// let client = DiscordClient::new("https://discord.com/api/v10", "42", "bot-token");
/// assert_eq!(
///     client.webhook_url("tok"),
///     "https://discord.com/api/v10/webhooks/42/tok"
/// );
/// ```
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    application_id: String,
    bot_token: String,
}

/// Partial guild object from `users/@me/guilds`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartialGuild {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl DiscordClient {
    pub fn new(
        api_base: impl Into<String>,
        application_id: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            application_id: application_id.into(),
            bot_token: bot_token.into(),
        }
    }

    pub fn from_config(config: &DiscordConfig) -> Self {
        Self::new(&config.api_base, &config.application_id, &config.bot_token)
    }

    /// Interaction webhook URL for `token`.
    pub fn webhook_url(&self, token: &str) -> String {
        format!(
            "{}/webhooks/{}/{token}",
            self.api_base, self.application_id
        )
    }

    /// Fetches one page of guilds the bot is a member of.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::DiscordApi` if the request fails or Discord
    /// rejects it.
    pub async fn current_user_guilds(
        &self,
        limit: usize,
        after: Option<&str>,
    ) -> Result<Vec<PartialGuild>, ServerError> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }
        debug!(limit, after, "Listing guilds");

        let resp = self
            .http
            .get(format!("{}/users/@me/guilds", self.api_base))
            .header("Authorization", format!("Bot {}", self.bot_token))
            .query(&query)
            .send()
            .await
            .map_err(|e| ServerError::DiscordApi(format!("users/@me/guilds request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(%status, body = %text, "Discord API error");
            return Err(ServerError::DiscordApi(format!(
                "users/@me/guilds returned {status}: {text}"
            )));
        }

        resp.json().await.map_err(|e| {
            ServerError::DiscordApi(format!("users/@me/guilds response parse failed: {e}"))
        })
    }

    /// Fetches every guild the bot is a member of, following `after` cursors.
    ///
    /// # Errors
    ///
    /// Returns the first page error encountered.
    pub async fn all_guilds(&self) -> Result<Vec<PartialGuild>, ServerError> {
        collect_pages(GUILDS_PAGE_SIZE, |after| async move {
            self.current_user_guilds(GUILDS_PAGE_SIZE, after.as_deref())
                .await
        })
        .await
    }
}

impl fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordClient")
            .field("api_base", &self.api_base)
            .field("application_id", &self.application_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl InteractionWebhook for DiscordClient {
    async fn execute_webhook(
        &self,
        token: &str,
        message: &WebhookMessage,
    ) -> Result<(), ServerError> {
        debug!(
            application_id = %self.application_id,
            embeds = message.embeds.len(),
            "Executing interaction webhook"
        );
        let resp = self
            .http
            .post(self.webhook_url(token))
            .json(message)
            .send()
            .await
            .map_err(|e| ServerError::DiscordApi(format!("webhook request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ServerError::DiscordApi(format!(
                "webhook returned {status}: {text}"
            )));
        }
        Ok(())
    }
}

/// Drains a cursor-paginated guild listing.
///
/// `fetch` receives the id of the last guild seen (`None` for the first
/// page). Stops at the first page shorter than `page_size`.
async fn collect_pages<F, Fut>(
    page_size: usize,
    mut fetch: F,
) -> Result<Vec<PartialGuild>, ServerError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Vec<PartialGuild>, ServerError>>,
{
    let mut guilds = Vec::new();
    let mut after = None;
    loop {
        let page = fetch(after.take()).await?;
        let last = page.last().map(|g| g.id.clone());
        let done = page.len() < page_size;
        guilds.extend(page);
        match last {
            Some(id) if !done => after = Some(id),
            _ => return Ok(guilds),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::http::{Method, StatusCode};

    use super::test_support::CaptureServer;
    use super::*;

    fn guilds(range: std::ops::Range<usize>) -> Vec<PartialGuild> {
        range
            .map(|i| PartialGuild {
                id: format!("{i:04}"),
                name: format!("guild {i}"),
            })
            .collect()
    }

    #[test]
    fn test_should_build_webhook_url_without_double_slash() {
        let client = DiscordClient::new("https://discord.com/api/v10/", "42", "t");
        assert_eq!(
            client.webhook_url("abc"),
            "https://discord.com/api/v10/webhooks/42/abc"
        );
    }

    #[test]
    fn test_should_not_print_bot_token() {
        let client = DiscordClient::new("https://discord.com/api/v10", "42", "secret-token");
        let debug = format!("{client:?}");
        assert!(debug.contains("DiscordClient"));
        assert!(!debug.contains("secret-token"));
    }

    #[tokio::test]
    async fn test_should_follow_cursor_until_short_page() {
        let cursors = Mutex::new(Vec::new());
        let all = collect_pages(3, |after| {
            cursors.lock().unwrap().push(after.clone());
            async move {
                Ok(match after.as_deref() {
                    None => guilds(0..3),
                    Some("0002") => guilds(3..6),
                    Some("0005") => guilds(6..7),
                    Some(other) => panic!("unexpected cursor {other}"),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(all.len(), 7);
        assert_eq!(
            *cursors.lock().unwrap(),
            vec![None, Some("0002".to_string()), Some("0005".to_string())]
        );
    }

    #[tokio::test]
    async fn test_should_stop_on_empty_page() {
        let mut calls = 0;
        let all = collect_pages(2, |_| {
            calls += 1;
            let page = if calls == 1 { guilds(0..2) } else { Vec::new() };
            async move { Ok(page) }
        })
        .await
        .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_should_propagate_page_error() {
        let result = collect_pages(2, |_| async {
            Err(ServerError::DiscordApi("401 Unauthorized".into()))
        })
        .await;
        assert!(matches!(result, Err(ServerError::DiscordApi(_))));
    }

    #[tokio::test]
    async fn test_should_post_message_to_interaction_webhook() {
        let server = CaptureServer::start(StatusCode::OK, "{}").await;
        let client = DiscordClient::new(&server.base_url, "42", "bot-secret");

        client
            .execute_webhook("tok-7", &WebhookMessage::text("Monkey Face"))
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, "/webhooks/42/tok-7");
        assert_eq!(requests[0].headers["content-type"], "application/json");
        assert!(requests[0].headers.get("authorization").is_none());
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, serde_json::json!({ "content": "Monkey Face" }));
    }

    #[tokio::test]
    async fn test_should_map_webhook_rejection_to_discord_error() {
        let server = CaptureServer::start(StatusCode::NOT_FOUND, "Unknown Webhook").await;
        let client = DiscordClient::new(&server.base_url, "42", "t");

        let err = client
            .execute_webhook("expired", &WebhookMessage::text("late"))
            .await
            .unwrap_err();
        assert!(matches!(&err, ServerError::DiscordApi(msg) if msg.contains("404")));
        assert!(err.to_string().contains("Unknown Webhook"));
    }

    #[tokio::test]
    async fn test_should_list_guilds_with_bot_authorization() {
        let guilds = r#"[{"id":"1","name":"Crushers"}]"#;
        let server = CaptureServer::start(StatusCode::OK, guilds).await;
        let client = DiscordClient::new(&server.base_url, "42", "bot-secret");

        let guilds = client.all_guilds().await.unwrap();
        assert_eq!(
            guilds,
            vec![PartialGuild {
                id: "1".into(),
                name: "Crushers".into(),
            }]
        );

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].path, "/users/@me/guilds");
        assert_eq!(requests[0].query.as_deref(), Some("limit=200"));
        assert_eq!(requests[0].headers["authorization"], "Bot bot-secret");
    }
}
