//! Typesense multi-search access for autocomplete.
//!
//! [`SearchIndex`] is the seam the autocomplete handlers depend on;
//! [`TypesenseClient`] implements it over the Typesense HTTP API. Hits come
//! back as raw JSON documents and are typed by the caller with
//! [`parse_documents`], since each collection has its own schema.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::CoreError;
use crate::discipline::Discipline;

/// Results requested per autocomplete search. Discord accepts at most 25 choices.
pub const RESULTS_PER_PAGE: u32 = 25;

fn default_port() -> u16 {
    443
}

fn default_protocol() -> String {
    "https".to_string()
}

fn default_connection_timeout_secs() -> u64 {
    2
}

/// Connection settings for a single-node Typesense cluster.
///
/// # Examples
///
/// ```
/// use cragbot_core::TypesenseConfig;
///
/// let json = r#"{"host": "xyz.a1.typesense.net", "api_key": "search-only"}"#;
/// let config: TypesenseConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.port, 443);
/// assert_eq!(config.base_url(), "https://xyz.a1.typesense.net:443");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesenseConfig {
    /// Node host name, without scheme or port.
    pub host: String,

    /// Search-only API key.
    pub api_key: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Per-request timeout; autocomplete must answer well inside Discord's budget.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
}

impl TypesenseConfig {
    /// Returns `protocol://host:port`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// One search inside a `multi_search` call.
///
/// # Examples
///
/// ```
/// use cragbot_core::SearchRequest;
///
/// let request = SearchRequest::new("areas", "smith", "name, pathTokens")
///     .sort_by("_text_match:desc,totalClimbs:desc");
/// assert_eq!(request.sort_by.as_deref(), Some("_text_match:desc,totalClimbs:desc"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub collection: String,
    pub q: String,
    pub query_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
}

impl SearchRequest {
    pub fn new(collection: &str, q: &str, query_by: &str) -> Self {
        Self {
            collection: collection.to_string(),
            q: q.to_string(),
            query_by: query_by.to_string(),
            sort_by: None,
        }
    }

    pub fn sort_by(mut self, sort_by: &str) -> Self {
        self.sort_by = Some(sort_by.to_string());
        self
    }
}

/// A document from the `climbs` collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimbDocument {
    #[serde(rename = "climbUUID")]
    pub climb_uuid: String,
    pub climb_name: String,
    #[serde(default)]
    pub area_names: Vec<String>,
    #[serde(default)]
    pub disciplines: Vec<Discipline>,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub fa: Option<String>,
}

/// A document from the `areas` collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaDocument {
    #[serde(rename = "areaUUID")]
    pub area_uuid: String,
    pub name: String,
    #[serde(default)]
    pub path_tokens: Vec<String>,
    #[serde(default)]
    pub total_climbs: u64,
    #[serde(default)]
    pub density: f64,
    #[serde(default)]
    pub leaf: bool,
}

/// Abstraction over the search index used by autocomplete.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Runs a single search and returns the hit documents in rank order.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Search` if the index reports an error for the
    /// search, or a transport error if the request fails.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<serde_json::Value>, CoreError>;
}

/// Deserializes raw hit documents into a collection's document type.
///
/// # Errors
///
/// Returns `CoreError::Json` if any document does not match `T`.
pub fn parse_documents<T: DeserializeOwned>(
    documents: Vec<serde_json::Value>,
) -> Result<Vec<T>, CoreError> {
    documents
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(CoreError::from))
        .collect()
}

#[derive(Debug, Deserialize)]
struct MultiSearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    hits: Option<Vec<SearchHit>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    document: serde_json::Value,
}

fn collect_hits(response: MultiSearchResponse) -> Result<Vec<serde_json::Value>, CoreError> {
    let mut documents = Vec::new();
    for result in response.results {
        if let Some(error) = result.error {
            return Err(CoreError::Search(error));
        }
        documents.extend(result.hits.unwrap_or_default().into_iter().map(|h| h.document));
    }
    Ok(documents)
}

/// HTTP client for the Typesense `multi_search` endpoint.
#[derive(Debug, Clone)]
pub struct TypesenseClient {
    http: reqwest::Client,
    config: TypesenseConfig,
}

impl TypesenseClient {
    /// Builds a client with the configured connection timeout.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: TypesenseConfig) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.connection_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl SearchIndex for TypesenseClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<serde_json::Value>, CoreError> {
        let body = serde_json::json!({ "searches": [request] });
        let per_page = RESULTS_PER_PAGE.to_string();
        debug!(collection = %request.collection, q = %request.q, "Running multi_search");
        let response = self
            .http
            .post(format!("{}/multi_search", self.config.base_url()))
            .query(&[("page", "1"), ("per_page", per_page.as_str())])
            .header("X-TYPESENSE-API-KEY", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "Typesense multi_search failed");
            return Err(CoreError::Search(format!("multi_search {status}: {text}")));
        }

        let parsed: MultiSearchResponse = response.json().await?;
        collect_hits(parsed)
    }
}
