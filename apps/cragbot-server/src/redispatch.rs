//! Self re-dispatch of a full command into its deferred phase.
//!
//! The fresh invocation acknowledges Discord immediately and hands the work
//! to a second invocation of the same endpoint. The second request carries
//! the original signed body unchanged, the original signature headers, and
//! an `x-deferred: true` marker.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::ServerError;

/// Marker header telling the endpoint it is running the deferred phase.
pub const DEFERRED_HEADER: &str = "x-deferred";

/// Returns `true` if the request carries `x-deferred: true`.
///
/// # Examples
///
/// ```
/// use axum::http::{HeaderMap, HeaderValue};
/// use cragbot_server::redispatch::is_deferred;
///
/// let mut headers = HeaderMap::new();
/// assert!(!is_deferred(&headers));
/// headers.insert("x-deferred", HeaderValue::from_static("true"));
/// assert!(is_deferred(&headers));
/// ```
pub fn is_deferred(headers: &HeaderMap) -> bool {
    headers
        .get(DEFERRED_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// The request sent to start the deferred phase.
#[derive(Debug, Clone)]
pub struct DeferredEnvelope {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl DeferredEnvelope {
    /// Builds the envelope from the inbound request.
    ///
    /// Hop-by-hop and length headers are dropped; the HTTP client sets its
    /// own. Every other header, including the signature pair, is forwarded.
    pub fn new(url: impl Into<String>, inbound: &HeaderMap, body: Bytes) -> Self {
        let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
        for (name, value) in inbound {
            if [HOST, CONTENT_LENGTH, CONNECTION, TRANSFER_ENCODING].contains(name) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        headers.insert(
            HeaderName::from_static(DEFERRED_HEADER),
            HeaderValue::from_static("true"),
        );
        Self {
            url: url.into(),
            headers,
            body,
        }
    }
}

/// Transport for the deferred re-dispatch.
#[async_trait]
pub trait Redispatcher: Send + Sync {
    /// # Errors
    ///
    /// Returns `ServerError::Redispatch` if the request cannot be sent or is
    /// rejected.
    async fn redispatch(&self, envelope: DeferredEnvelope) -> Result<(), ServerError>;
}

/// [`Redispatcher`] that POSTs the envelope over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpRedispatcher {
    http: reqwest::Client,
}

impl HttpRedispatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Redispatcher for HttpRedispatcher {
    async fn redispatch(&self, envelope: DeferredEnvelope) -> Result<(), ServerError> {
        debug!(url = %envelope.url, bytes = envelope.body.len(), "Re-dispatching interaction");
        let resp = self
            .http
            .post(&envelope.url)
            .headers(envelope.headers)
            .body(envelope.body)
            .send()
            .await
            .map_err(|e| {
                ServerError::Redispatch(format!("request to {} failed: {e}", envelope.url))
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ServerError::Redispatch(format!(
                "{} returned {status}",
                envelope.url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Records envelopes; optionally sleeps or fails first.
    #[derive(Debug, Default)]
    pub struct RecordingRedispatcher {
        pub sent: Mutex<Vec<DeferredEnvelope>>,
        pub delay: Option<Duration>,
        pub fail: bool,
    }

    impl RecordingRedispatcher {
        pub fn envelopes(&self) -> Vec<DeferredEnvelope> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Redispatcher for RecordingRedispatcher {
        async fn redispatch(&self, envelope: DeferredEnvelope) -> Result<(), ServerError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.sent.lock().unwrap().push(envelope);
            if self.fail {
                return Err(ServerError::Redispatch("connection refused".into()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use super::*;
    use crate::decoder::{decode, test_support::signed_headers};
    use crate::discord_client::test_support::CaptureServer;
    use crate::interaction::Interaction;
    use crate::signature::test_support::public_key_hex;

    const BODY: &[u8] = br#"{"type":2,"id":"9","application_id":"42","token":"tok","locale":"en-US","data":{"name":"crag","options":[{"name":"name","type":3,"value":"a-1"}]}}"#;

    fn inbound_headers() -> HeaderMap {
        let mut headers = signed_headers(BODY);
        headers.insert(HOST, HeaderValue::from_static("bot.example.net"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("150"));
        headers.insert("user-agent", HeaderValue::from_static("Discord-Interactions/1.0"));
        headers
    }

    fn envelope(url: &str) -> DeferredEnvelope {
        DeferredEnvelope::new(url, &inbound_headers(), Bytes::from_static(BODY))
    }

    #[test]
    fn test_should_mark_envelope_as_deferred() {
        let envelope = envelope("https://bot/interactions");
        assert!(is_deferred(&envelope.headers));
        assert_eq!(envelope.url, "https://bot/interactions");
    }

    #[test]
    fn test_should_drop_host_and_length_headers() {
        let envelope = envelope("https://bot/interactions");
        assert!(envelope.headers.get(HOST).is_none());
        assert!(envelope.headers.get(CONTENT_LENGTH).is_none());
        assert_eq!(envelope.headers["user-agent"], "Discord-Interactions/1.0");
    }

    #[test]
    fn test_should_round_trip_original_interaction() {
        let original: Interaction = serde_json::from_slice(BODY).unwrap();
        let envelope = envelope("https://bot/interactions");

        let decoded = decode(&envelope.headers, &envelope.body, &public_key_hex()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_should_ignore_non_true_marker() {
        let mut headers = HeaderMap::new();
        headers.insert(DEFERRED_HEADER, HeaderValue::from_static("false"));
        assert!(!is_deferred(&headers));
        headers.insert(DEFERRED_HEADER, HeaderValue::from_static("TRUE"));
        assert!(is_deferred(&headers));
    }

    #[tokio::test]
    async fn test_should_post_signed_body_with_deferred_marker() {
        let server = CaptureServer::start(StatusCode::OK, "OK").await;
        let url = format!("{}/interactions", server.base_url);

        HttpRedispatcher::new()
            .redispatch(envelope(&url))
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/interactions");
        assert_eq!(request.body, Bytes::from_static(BODY));
        assert!(is_deferred(&request.headers));
        assert_eq!(request.headers[CONTENT_LENGTH], BODY.len().to_string().as_str());
        assert_ne!(request.headers[HOST], "bot.example.net");

        let inbound = inbound_headers();
        for name in ["x-signature-ed25519", "x-signature-timestamp"] {
            assert_eq!(request.headers[name], inbound[name]);
        }
        let decoded = decode(&request.headers, &request.body, &public_key_hex()).unwrap();
        assert_eq!(decoded.token, "tok");
    }

    #[tokio::test]
    async fn test_should_map_rejected_redispatch_to_error() {
        let server = CaptureServer::start(StatusCode::BAD_GATEWAY, "").await;
        let url = format!("{}/interactions", server.base_url);

        let err = HttpRedispatcher::new()
            .redispatch(envelope(&url))
            .await
            .unwrap_err();
        assert!(matches!(&err, ServerError::Redispatch(msg) if msg.contains("502")));
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_should_map_unreachable_target_to_error() {
        let err = HttpRedispatcher::new()
            .redispatch(envelope("http://127.0.0.1:9/interactions"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Redispatch(_)));
    }
}
