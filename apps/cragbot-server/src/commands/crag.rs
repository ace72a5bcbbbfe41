//! `/crag`: look up a climbing area.

use std::sync::Arc;

use async_trait::async_trait;
use cragbot_core::{AreaDocument, OpenBetaApi, SearchIndex, SearchRequest, parse_documents};
use tracing::{debug, instrument, warn};

use super::{AutocompleteHandler, CommandHandler, required_option};
use crate::error::ServerError;
use crate::formatter;
use crate::interaction::{AutocompleteResponse, Interaction, WebhookMessage};

/// Registered command name.
pub const NAME: &str = "crag";

const AREAS_COLLECTION: &str = "areas";
const AREAS_QUERY_BY: &str = "name, pathTokens";

/// Best text match first; an empty query lists the densest areas.
fn sort_for(query: &str) -> &'static str {
    if query.trim().is_empty() {
        "density:desc"
    } else {
        "_text_match:desc,totalClimbs:desc"
    }
}

pub struct CragCommand {
    openbeta: Arc<dyn OpenBetaApi>,
    search: Arc<dyn SearchIndex>,
}

impl CragCommand {
    pub fn new(openbeta: Arc<dyn OpenBetaApi>, search: Arc<dyn SearchIndex>) -> Self {
        Self { openbeta, search }
    }
}

#[async_trait]
impl CommandHandler for CragCommand {
    #[instrument(skip_all, fields(command = NAME))]
    async fn handle(&self, interaction: &Interaction) -> Result<WebhookMessage, ServerError> {
        let uuid = required_option(interaction, "name")?;
        let area = self.openbeta.area(uuid).await?;
        debug!(
            uuid,
            children = area.children.len(),
            climbs = area.climbs.len(),
            "Fetched area"
        );
        Ok(WebhookMessage::embed(formatter::area_embed(&area)))
    }
}

#[async_trait]
impl AutocompleteHandler for CragCommand {
    #[instrument(skip_all, fields(command = NAME))]
    async fn autocomplete(
        &self,
        interaction: &Interaction,
    ) -> Result<AutocompleteResponse, ServerError> {
        let Some(focused) = interaction.focused_option() else {
            return Ok(AutocompleteResponse::empty());
        };
        if focused.name != "name" {
            warn!(option = %focused.name, "No autocomplete for option");
            return Ok(AutocompleteResponse::empty());
        }

        let query = focused.value_str().unwrap_or_default();
        let request =
            SearchRequest::new(AREAS_COLLECTION, query, AREAS_QUERY_BY).sort_by(sort_for(query));
        let docs: Vec<AreaDocument> = parse_documents(self.search.search(&request).await?)?;
        Ok(AutocompleteResponse::new(formatter::choices(
            docs.iter().map(formatter::crag_choice),
        )))
    }
}

#[cfg(test)]
mod tests {
    use cragbot_core::openbeta::{Area, AreaRef, Content};
    use serde_json::json;

    use super::*;
    use crate::commands::test_support::{FakeOpenBeta, FakeSearch, interaction};

    fn command(search: FakeSearch) -> (CragCommand, Arc<FakeSearch>) {
        let search = Arc::new(search);
        let openbeta = FakeOpenBeta {
            climbs: Vec::new(),
            areas: vec![Area {
                uuid: "a-1".into(),
                area_name: "Smith Rock".into(),
                path_tokens: vec!["USA".into(), "Oregon".into(), "Smith Rock".into()],
                total_climbs: Some(1800),
                content: Content::default(),
                media: Vec::new(),
                children: vec![AreaRef {
                    uuid: "a-2".into(),
                    area_name: "Morning Glory Wall".into(),
                }],
                climbs: Vec::new(),
            }],
        };
        (CragCommand::new(Arc::new(openbeta), search.clone()), search)
    }

    fn area_docs(count: usize) -> Vec<serde_json::Value> {
        (0..count)
            .map(|i| {
                json!({
                    "areaUUID": format!("a-{i}"),
                    "name": format!("Area {i}"),
                    "pathTokens": ["USA", "Oregon", format!("Area {i}")],
                    "totalClimbs": i,
                    "density": 0.1
                })
            })
            .collect()
    }

    #[test]
    fn test_should_sort_blank_query_by_density() {
        assert_eq!(sort_for("   "), "density:desc");
        assert_eq!(sort_for("smith"), "_text_match:desc,totalClimbs:desc");
    }

    #[tokio::test]
    async fn test_should_suggest_areas_capped_at_limit() {
        let (cmd, search) = command(FakeSearch::with_documents(area_docs(30)));
        let i = interaction(
            4,
            NAME,
            json!([{ "name": "name", "type": 3, "value": "", "focused": true }]),
        );

        let response = cmd.autocomplete(&i).await.unwrap();
        assert_eq!(response.data.choices.len(), formatter::MAX_CHOICES);
        assert_eq!(response.data.choices[0].name, "Area 0 (Oregon) (0 climbs)");

        let request = &search.requests()[0];
        assert_eq!(request.collection, "areas");
        assert_eq!(request.sort_by.as_deref(), Some("density:desc"));
    }

    #[tokio::test]
    async fn test_should_ignore_unknown_focused_option() {
        let (cmd, search) = command(FakeSearch::with_documents(area_docs(1)));
        let i = interaction(
            4,
            NAME,
            json!([{ "name": "region", "type": 3, "value": "or", "focused": true }]),
        );

        let response = cmd.autocomplete(&i).await.unwrap();
        assert!(response.data.choices.is_empty());
        assert!(search.requests().is_empty());
    }

    #[tokio::test]
    async fn test_should_render_area_embed() {
        let (cmd, _) = command(FakeSearch::default());
        let i = interaction(2, NAME, json!([{ "name": "name", "type": 3, "value": "a-1" }]));

        let message = cmd.handle(&i).await.unwrap();
        let embed = &message.embeds[0];
        assert_eq!(embed.title.as_deref(), Some("Smith Rock"));
        assert_eq!(embed.fields[0].name, "Areas");
    }

    #[tokio::test]
    async fn test_should_reject_missing_name_option() {
        let (cmd, _) = command(FakeSearch::default());
        let i = interaction(2, NAME, json!([]));

        let err = cmd.handle(&i).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidInput(_)));
    }
}
