//! OpenBeta GraphQL API access.
//!
//! Defines the [`OpenBetaApi`] trait for the two lookups the bot performs and
//! [`DefaultOpenBeta`], the production implementation that posts GraphQL
//! queries with `reqwest`. The trait keeps command handlers testable without
//! network access.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::CoreError;
use crate::discipline::DisciplineFlags;

/// Default public OpenBeta GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openbeta.io";

/// CDN host serving OpenBeta media.
const MEDIA_BASE: &str = "https://openbeta.sirv.com";

const GET_CLIMB_QUERY: &str = r#"
query GetClimb($uuid: ID!) {
  climb(uuid: $uuid) {
    uuid
    name
    fa
    safety
    pathTokens
    grades { font french vscale yds }
    content { description location protection }
    media { mediaType mediaUrl format }
    type { trad tr sport snow mixed ice bouldering alpine aid }
  }
}
"#;

const GET_AREA_QUERY: &str = r#"
query GetArea($uuid: ID!) {
  area(uuid: $uuid) {
    uuid
    area_name
    pathTokens
    totalClimbs
    content { description }
    media { mediaType mediaUrl format }
    children { uuid area_name }
    climbs { uuid name }
  }
}
"#;

/// Grades in the scales OpenBeta tracks. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Grades {
    #[serde(default)]
    pub yds: Option<String>,
    #[serde(default)]
    pub vscale: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub french: Option<String>,
}

/// Free-text content attached to a climb or area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub protection: Option<String>,
}

/// A media item (photo or video) tagged on a climb or area.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub media_url: String,
    /// `0` for images.
    #[serde(default)]
    pub media_type: Option<i64>,
    #[serde(default)]
    pub format: Option<String>,
}

impl Media {
    /// Whether this item can be rendered as an embed thumbnail.
    pub fn is_image(&self) -> bool {
        match self.format.as_deref() {
            Some(format) => matches!(format, "jpeg" | "png" | "webp"),
            None => self.media_type == Some(0),
        }
    }

    /// Absolute CDN URL for the media item.
    ///
    /// # Examples
    ///
    /// ```
    /// use cragbot_core::openbeta::Media;
    ///
    /// let media = Media { media_url: "/u/abc.jpg".into(), media_type: Some(0), format: None };
    /// assert_eq!(media.url(), "https://openbeta.sirv.com/u/abc.jpg");
    /// ```
    pub fn url(&self) -> String {
        if self.media_url.starts_with("http") {
            self.media_url.clone()
        } else {
            format!("{MEDIA_BASE}{}", self.media_url)
        }
    }
}

/// A single climb as returned by `GetClimb`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Climb {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub fa: Option<String>,
    #[serde(default)]
    pub safety: Option<String>,
    #[serde(default)]
    pub path_tokens: Vec<String>,
    #[serde(default)]
    pub grades: Option<Grades>,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(rename = "type", default)]
    pub disciplines: DisciplineFlags,
}

/// Link to a child area.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AreaRef {
    pub uuid: String,
    pub area_name: String,
}

/// Link to a climb inside an area.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClimbRef {
    pub uuid: String,
    pub name: String,
}

/// A crag or area as returned by `GetArea`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub uuid: String,
    #[serde(rename = "area_name")]
    pub area_name: String,
    #[serde(default)]
    pub path_tokens: Vec<String>,
    #[serde(default)]
    pub total_climbs: Option<u64>,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub children: Vec<AreaRef>,
    #[serde(default)]
    pub climbs: Vec<ClimbRef>,
}

/// Abstraction over the OpenBeta lookups used by the bot's commands.
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// across request tasks.
#[async_trait]
pub trait OpenBetaApi: Send + Sync {
    /// Fetches a climb by UUID.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` when the API has no such climb, or a
    /// transport/GraphQL error otherwise.
    async fn climb(&self, uuid: &str) -> Result<Climb, CoreError>;

    /// Fetches an area by UUID.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` when the API has no such area, or a
    /// transport/GraphQL error otherwise.
    async fn area(&self, uuid: &str) -> Result<Area, CoreError>;
}

/// Production [`OpenBetaApi`] backed by the public GraphQL endpoint.
///
/// # Examples
///
/// ```
/// use cragbot_core::DefaultOpenBeta;
///
/// let client = DefaultOpenBeta::new("https://api.openbeta.io".into());
/// assert_eq!(client.endpoint(), "https://api.openbeta.io");
/// ```
#[derive(Debug, Clone)]
pub struct DefaultOpenBeta {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ClimbData {
    climb: Option<Climb>,
}

#[derive(Debug, Deserialize)]
struct AreaData {
    area: Option<Area>,
}

impl DefaultOpenBeta {
    /// Creates a client for the given GraphQL endpoint.
    pub fn new(endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Returns the configured GraphQL endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, CoreError> {
        let body = serde_json::json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        });
        debug!(operation, "Sending GraphQL request");
        let response: GraphQlResponse<T> = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        unwrap_response(operation, response)
    }
}

fn unwrap_response<T>(operation: &str, response: GraphQlResponse<T>) -> Result<T, CoreError> {
    if !response.errors.is_empty() {
        let message = response
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        warn!(operation, error = %message, "GraphQL request returned errors");
        return Err(CoreError::GraphQl(format!("{operation}: {message}")));
    }
    response
        .data
        .ok_or_else(|| CoreError::GraphQl(format!("{operation}: response missing 'data'")))
}

#[async_trait]
impl OpenBetaApi for DefaultOpenBeta {
    async fn climb(&self, uuid: &str) -> Result<Climb, CoreError> {
        let data: ClimbData = self
            .request("GetClimb", GET_CLIMB_QUERY, serde_json::json!({ "uuid": uuid }))
            .await?;
        data.climb
            .ok_or_else(|| CoreError::NotFound(format!("climb {uuid}")))
    }

    async fn area(&self, uuid: &str) -> Result<Area, CoreError> {
        let data: AreaData = self
            .request("GetArea", GET_AREA_QUERY, serde_json::json!({ "uuid": uuid }))
            .await?;
        data.area
            .ok_or_else(|| CoreError::NotFound(format!("area {uuid}")))
    }
}
