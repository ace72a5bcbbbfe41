//! `/climb`: look up a single climb.
//!
//! Autocomplete searches the Typesense `climbs` collection; the handler
//! fetches the selected climb from OpenBeta and renders it as an embed.

use std::sync::Arc;

use async_trait::async_trait;
use cragbot_core::{
    AreaDocument, ClimbDocument, OpenBetaApi, SearchIndex, SearchRequest, parse_documents,
};
use tracing::{debug, instrument, warn};

use super::{AutocompleteHandler, CommandHandler, required_option};
use crate::error::ServerError;
use crate::formatter;
use crate::interaction::{AutocompleteResponse, Interaction, WebhookMessage};

/// Registered command name.
pub const NAME: &str = "climb";

const CLIMBS_COLLECTION: &str = "climbs";
const CLIMBS_QUERY_BY: &str = "climbName, climbDesc";
const AREAS_COLLECTION: &str = "areas";
const AREAS_QUERY_BY: &str = "name, pathTokens";
const AREAS_SORT_BY: &str = "_text_match:desc,totalClimbs:desc";

pub struct ClimbCommand {
    openbeta: Arc<dyn OpenBetaApi>,
    search: Arc<dyn SearchIndex>,
}

impl ClimbCommand {
    pub fn new(openbeta: Arc<dyn OpenBetaApi>, search: Arc<dyn SearchIndex>) -> Self {
        Self { openbeta, search }
    }
}

#[async_trait]
impl CommandHandler for ClimbCommand {
    #[instrument(skip_all, fields(command = NAME))]
    async fn handle(&self, interaction: &Interaction) -> Result<WebhookMessage, ServerError> {
        let uuid = required_option(interaction, "name")?;
        let climb = self.openbeta.climb(uuid).await?;
        debug!(uuid, name = %climb.name, "Fetched climb");
        Ok(WebhookMessage::embed(formatter::climb_embed(&climb)))
    }
}

#[async_trait]
impl AutocompleteHandler for ClimbCommand {
    #[instrument(skip_all, fields(command = NAME))]
    async fn autocomplete(
        &self,
        interaction: &Interaction,
    ) -> Result<AutocompleteResponse, ServerError> {
        let Some(focused) = interaction.focused_option() else {
            return Ok(AutocompleteResponse::empty());
        };
        let query = focused.value_str().unwrap_or_default();

        let choices = match focused.name.as_str() {
            "name" => {
                let request = SearchRequest::new(CLIMBS_COLLECTION, query, CLIMBS_QUERY_BY);
                let docs: Vec<ClimbDocument> =
                    parse_documents(self.search.search(&request).await?)?;
                formatter::choices(docs.iter().map(formatter::climb_choice))
            }
            "area" => {
                let request = SearchRequest::new(AREAS_COLLECTION, query, AREAS_QUERY_BY)
                    .sort_by(AREAS_SORT_BY);
                let docs: Vec<AreaDocument> =
                    parse_documents(self.search.search(&request).await?)?;
                formatter::choices(docs.iter().map(formatter::area_filter_choice))
            }
            other => {
                warn!(option = other, "No autocomplete for option");
                Vec::new()
            }
        };
        debug!(count = choices.len(), "Autocomplete choices");
        Ok(AutocompleteResponse::new(choices))
    }
}
