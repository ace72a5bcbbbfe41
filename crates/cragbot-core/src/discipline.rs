//! Climbing discipline helpers.
//!
//! OpenBeta reports disciplines two ways: the GraphQL `type` object is a set
//! of boolean flags ([`DisciplineFlags`]), while Typesense documents carry a
//! list of lowercase names. Both resolve to [`Discipline`].

use serde::{Deserialize, Serialize};

/// A single climbing discipline.
///
/// # Examples
///
/// ```
/// use cragbot_core::Discipline;
///
/// assert_eq!(Discipline::Tr.label(), "TR");
/// assert_eq!(Discipline::Boulder.label(), "Bouldering");
/// assert_eq!(Discipline::Sport.icon(), Some("🪢"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    Trad,
    Tr,
    Sport,
    Aid,
    Boulder,
    Bouldering,
    Alpine,
    Snow,
    Ice,
    Mixed,
    /// Any discipline name this crate does not know about.
    #[serde(other)]
    Other,
}

impl Discipline {
    /// Short emoji used in autocomplete choice labels.
    pub fn icon(self) -> Option<&'static str> {
        match self {
            Self::Trad | Self::Tr | Self::Sport | Self::Aid => Some("🪢"),
            Self::Boulder | Self::Bouldering => Some("🪨"),
            Self::Alpine | Self::Snow | Self::Ice | Self::Mixed => Some("⛏️"),
            Self::Other => None,
        }
    }

    /// Human-readable label used in embeds.
    pub fn label(self) -> &'static str {
        match self {
            Self::Trad => "Trad",
            Self::Tr => "TR",
            Self::Sport => "Sport",
            Self::Aid => "Aid",
            Self::Boulder | Self::Bouldering => "Bouldering",
            Self::Alpine => "Alpine",
            Self::Snow => "Snow",
            Self::Ice => "Ice",
            Self::Mixed => "Mixed",
            Self::Other => "Other",
        }
    }
}

/// Discipline flags as returned by the GraphQL `climb.type` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisciplineFlags {
    #[serde(default)]
    pub trad: bool,
    #[serde(default)]
    pub tr: bool,
    #[serde(default)]
    pub sport: bool,
    #[serde(default)]
    pub aid: bool,
    #[serde(default)]
    pub bouldering: bool,
    #[serde(default)]
    pub alpine: bool,
    #[serde(default)]
    pub snow: bool,
    #[serde(default)]
    pub ice: bool,
    #[serde(default)]
    pub mixed: bool,
}

impl DisciplineFlags {
    /// Returns the disciplines whose flag is set, in a stable order.
    pub fn disciplines(&self) -> Vec<Discipline> {
        [
            (self.trad, Discipline::Trad),
            (self.tr, Discipline::Tr),
            (self.sport, Discipline::Sport),
            (self.snow, Discipline::Snow),
            (self.mixed, Discipline::Mixed),
            (self.ice, Discipline::Ice),
            (self.bouldering, Discipline::Bouldering),
            (self.alpine, Discipline::Alpine),
            (self.aid, Discipline::Aid),
        ]
        .into_iter()
        .filter_map(|(set, discipline)| set.then_some(discipline))
        .collect()
    }
}

/// Concatenates the distinct icons for `disciplines`, preserving first-seen order.
///
/// # Examples
///
/// ```
/// use cragbot_core::Discipline;
/// use cragbot_core::discipline::icons;
///
/// let icons = icons(&[Discipline::Sport, Discipline::Trad, Discipline::Boulder]);
/// assert_eq!(icons, "🪢🪨");
/// ```
pub fn icons(disciplines: &[Discipline]) -> String {
    let mut seen: Vec<&'static str> = Vec::new();
    for icon in disciplines.iter().filter_map(|d| d.icon()) {
        if !seen.contains(&icon) {
            seen.push(icon);
        }
    }
    seen.concat()
}
