//! Out-of-band delivery of a deferred command's final message.
//!
//! A deferred interaction has already been acknowledged, so nothing can be
//! reported back to the caller. [`deliver`] therefore never fails: delivery
//! errors end at the log.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ServerError;
use crate::interaction::WebhookMessage;

/// Posts a message to the interaction webhook identified by `token`.
#[async_trait]
pub trait InteractionWebhook: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the webhook call fails or is rejected.
    async fn execute_webhook(&self, token: &str, message: &WebhookMessage)
    -> Result<(), ServerError>;
}

/// Delivers `message` for the interaction `token`, logging any failure.
pub async fn deliver(webhook: &dyn InteractionWebhook, token: &str, message: &WebhookMessage) {
    match webhook.execute_webhook(token, message).await {
        Ok(()) => info!(embeds = message.embeds.len(), "Delivered deferred response"),
        Err(e) => warn!(error = %e, "Failed to deliver deferred response"),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingWebhook;
    use super::*;

    #[tokio::test]
    async fn test_should_deliver_to_token() {
        let webhook = RecordingWebhook::default();
        deliver(&webhook, "tok-1", &WebhookMessage::text("hello")).await;
        assert_eq!(
            webhook.delivered(),
            vec![("tok-1".to_string(), WebhookMessage::text("hello"))]
        );
    }

    #[tokio::test]
    async fn test_should_swallow_delivery_failure() {
        let webhook = RecordingWebhook::failing();
        deliver(&webhook, "expired", &WebhookMessage::text("late")).await;
        assert_eq!(webhook.delivered().len(), 1);
    }
}
