//! Discord message builders for OpenBeta data.
//!
//! Pure functions that turn OpenBeta records into embeds and Typesense
//! documents into autocomplete choices. Discord's size limits are applied
//! here so command code never has to think about them.

use cragbot_core::discipline::icons;
use cragbot_core::openbeta::Media;
use cragbot_core::{Area, AreaDocument, Climb, ClimbDocument};

use crate::embed::{Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedImage, MAX_FIELDS};
use crate::interaction::AutocompleteChoice;

/// Public OpenBeta site, used for links and the embed author.
pub const OPENBETA_SITE: &str = "https://openbeta.io";

const AUTHOR_NAME: &str = "OpenBeta";
const AUTHOR_ICON_URL: &str = "https://cdn.discordapp.com/icons/815145484003967026/947e2c1eea520a9e28fb32e381387704.webp?size=128";

/// Discord rejects autocomplete responses with more choices than this.
pub const MAX_CHOICES: usize = 25;

/// Maximum length of an autocomplete choice name, in characters.
pub const MAX_CHOICE_NAME_CHARS: usize = 100;

/// Maximum length of an embed field value, in characters.
pub const MAX_FIELD_VALUE_CHARS: usize = 1024;

const LINKS_PER_FIELD: usize = 5;
const MAX_LINK_FIELDS: usize = 10;

/// Truncates `text` to at most `max_chars` characters, ending with `…` when
/// shortened.
///
/// # Examples
///
/// ```
/// use cragbot_server::formatter::truncate;
///
/// assert_eq!(truncate("Smith Rock", 20), "Smith Rock");
/// assert_eq!(truncate("Smith Rock", 5), "Smit…");
/// ```
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn author() -> EmbedAuthor {
    EmbedAuthor {
        name: AUTHOR_NAME.to_string(),
        url: Some(format!("{OPENBETA_SITE}/")),
        icon_url: Some(AUTHOR_ICON_URL.to_string()),
    }
}

fn footer(path_tokens: &[String]) -> Option<EmbedFooter> {
    (!path_tokens.is_empty()).then(|| EmbedFooter {
        text: path_tokens.join(" > "),
    })
}

fn thumbnail(media: &[Media]) -> Option<EmbedImage> {
    media
        .iter()
        .find(|m| m.is_image())
        .map(|m| EmbedImage { url: m.url() })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Builds the embed shown for `/climb`.
///
/// Fields, in order: Grade (YDS, falling back to V-scale), Type, Protection,
/// FA. Grade, Protection and FA are omitted when absent.
pub fn climb_embed(climb: &Climb) -> Embed {
    let mut fields = Vec::new();

    let grade = climb
        .grades
        .as_ref()
        .and_then(|g| non_empty(g.yds.as_deref()).or(non_empty(g.vscale.as_deref())));
    if let Some(grade) = grade {
        fields.push(EmbedField::new("Grade", grade, true));
    }

    let disciplines = climb
        .disciplines
        .disciplines()
        .into_iter()
        .map(|d| d.label())
        .collect::<Vec<_>>()
        .join(", ");
    if !disciplines.is_empty() {
        fields.push(EmbedField::new("Type", disciplines, true));
    }

    if let Some(protection) = non_empty(climb.content.protection.as_deref()) {
        fields.push(EmbedField::new(
            "Protection",
            truncate(protection, MAX_FIELD_VALUE_CHARS),
            false,
        ));
    }
    if let Some(fa) = non_empty(climb.fa.as_deref()) {
        fields.push(EmbedField::new(
            "FA",
            truncate(fa, MAX_FIELD_VALUE_CHARS),
            false,
        ));
    }

    Embed {
        title: Some(climb.name.clone()),
        description: non_empty(climb.content.description.as_deref()).map(str::to_string),
        url: Some(format!("{OPENBETA_SITE}/climbs/{}", climb.uuid)),
        thumbnail: thumbnail(&climb.media),
        footer: footer(&climb.path_tokens),
        author: Some(author()),
        fields,
    }
}

fn link_fields(name: &str, links: &[String]) -> Vec<EmbedField> {
    links
        .chunks(LINKS_PER_FIELD)
        .take(MAX_LINK_FIELDS)
        .map(|chunk| EmbedField::new(name, chunk.join("\n"), true))
        .collect()
}

/// Builds the embed shown for `/crag`.
///
/// Sub-areas and climbs are listed as markdown links, five per inline
/// field, at most ten "Areas" fields followed by ten "Climbs" fields.
pub fn area_embed(area: &Area) -> Embed {
    let areas: Vec<String> = area
        .children
        .iter()
        .map(|child| format!("[{}]({OPENBETA_SITE}/crag/{})", child.area_name, child.uuid))
        .collect();
    let climbs: Vec<String> = area
        .climbs
        .iter()
        .map(|climb| format!("[{}]({OPENBETA_SITE}/climb/{})", climb.name, climb.uuid))
        .collect();

    let mut fields = link_fields("Areas", &areas);
    fields.extend(link_fields("Climbs", &climbs));
    fields.truncate(MAX_FIELDS);

    Embed {
        title: Some(area.area_name.clone()),
        description: non_empty(area.content.description.as_deref()).map(str::to_string),
        url: Some(format!("{OPENBETA_SITE}/crag/{}", area.uuid)),
        thumbnail: thumbnail(&area.media),
        footer: footer(&area.path_tokens),
        author: Some(author()),
        fields,
    }
}

fn choice(name: String, value: &str) -> AutocompleteChoice {
    AutocompleteChoice {
        name: truncate(&name, MAX_CHOICE_NAME_CHARS),
        value: value.to_string(),
    }
}

/// `"{icons} {climbName} ({area}) ({grade})"`, valued by climb UUID.
pub fn climb_choice(doc: &ClimbDocument) -> AutocompleteChoice {
    let area = doc.area_names.last().map(String::as_str).unwrap_or_default();
    let label = format!(
        "{} {} ({area}) ({})",
        icons(&doc.disciplines),
        doc.climb_name,
        doc.grade
    );
    choice(label.trim_start().to_string(), &doc.climb_uuid)
}

/// `"{name} ({parent}) ({totalClimbs} climbs)"`, valued by area UUID.
///
/// `parent` is the second-to-last path token, empty for top-level areas.
pub fn crag_choice(doc: &AreaDocument) -> AutocompleteChoice {
    let parent = doc
        .path_tokens
        .len()
        .checked_sub(2)
        .and_then(|i| doc.path_tokens.get(i))
        .map(String::as_str)
        .unwrap_or_default();
    let label = format!("{} ({parent}) ({} climbs)", doc.name, doc.total_climbs);
    choice(label, &doc.area_uuid)
}

/// `"{name} ({totalClimbs})"`, used when a climb search is scoped by area.
pub fn area_filter_choice(doc: &AreaDocument) -> AutocompleteChoice {
    choice(format!("{} ({})", doc.name, doc.total_climbs), &doc.area_uuid)
}

/// Caps a choice list at [`MAX_CHOICES`].
pub fn choices(items: impl IntoIterator<Item = AutocompleteChoice>) -> Vec<AutocompleteChoice> {
    items.into_iter().take(MAX_CHOICES).collect()
}
