//! Template transfer document.
//!
//! Cards are identified by document-local `export_id` strings and reference
//! each other through them, so a document can be imported into any store.
//! Every field except `version` is optional on import.

use serde::{Deserialize, Serialize};

pub const TEMPLATE_EXPORT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateExport {
    pub version: u32,
    #[serde(default)]
    pub adventure: ExportAdventure,
    #[serde(default)]
    pub hero_setup: ExportHeroSetup,
    #[serde(default)]
    pub locations: Vec<ExportLocation>,
    #[serde(default)]
    pub races: Vec<ExportRace>,
    #[serde(default)]
    pub systems: Vec<ExportSystem>,
    #[serde(default)]
    pub techniques: Vec<ExportTechnique>,
    #[serde(default)]
    pub factions: Vec<ExportFaction>,
    #[serde(default)]
    pub other_info: Vec<ExportOtherInfo>,
    #[serde(default)]
    pub characters: Vec<ExportCharacter>,
    #[serde(default)]
    pub events: Vec<ExportEvent>,
    #[serde(default)]
    pub character_systems: Vec<ExportCharacterSystem>,
    #[serde(default)]
    pub character_techniques: Vec<ExportCharacterTechnique>,
    #[serde(default)]
    pub character_factions: Vec<ExportCharacterFaction>,
    #[serde(default)]
    pub relationships: Vec<ExportRelationship>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportAdventure {
    pub title: Option<String>,
    pub description: String,
    pub spec_instructions: String,
    pub intro: String,
    pub primary_hero: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportHeroSetup {
    pub default_location: Option<String>,
    pub require_race: bool,
    pub default_race: Option<String>,
    pub require_age: bool,
    pub default_age: Option<i64>,
    pub require_body_power: bool,
    pub default_body_power: Option<i64>,
    pub require_mind_power: bool,
    pub default_mind_power: Option<i64>,
    pub require_will_power: bool,
    pub default_will_power: Option<i64>,
    pub require_systems: bool,
    pub require_techniques: bool,
}

impl Default for ExportHeroSetup {
    fn default() -> Self {
        Self {
            default_location: None,
            require_race: true,
            default_race: None,
            require_age: false,
            default_age: None,
            require_body_power: true,
            default_body_power: None,
            require_mind_power: true,
            default_mind_power: None,
            require_will_power: true,
            default_will_power: None,
            require_systems: false,
            require_techniques: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportLocation {
    pub export_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
    #[serde(default = "one")]
    pub width: i64,
    #[serde(default = "one")]
    pub height: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn one() -> i64 {
    1
}

fn default_life_span() -> i64 {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRace {
    pub export_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_life_span")]
    pub life_span: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSystem {
    pub export_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub w_body: i64,
    #[serde(default)]
    pub w_mind: i64,
    #[serde(default)]
    pub w_will: i64,
    #[serde(default)]
    pub formula_hint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTechnique {
    pub export_id: String,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: i64,
    #[serde(default)]
    pub tier: Option<i64>,
    #[serde(default)]
    pub required_system_level: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFaction {
    pub export_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOtherInfo {
    pub export_id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportCharacter {
    pub export_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_player: bool,
    #[serde(default)]
    pub in_party: bool,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub body_power: i64,
    #[serde(default)]
    pub body_power_progress: i64,
    #[serde(default)]
    pub mind_power: i64,
    #[serde(default)]
    pub mind_power_progress: i64,
    #[serde(default)]
    pub will_power: i64,
    #[serde(default)]
    pub will_power_progress: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEvent {
    pub export_id: String,
    #[serde(default)]
    pub title: String,
    /// `inactive`, `active` or `resolved`; anything else imports as inactive.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub trigger_hint: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportCharacterSystem {
    pub character: Option<String>,
    pub system: Option<String>,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub progress_percent: i64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportCharacterTechnique {
    pub character: Option<String>,
    pub technique: Option<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportCharacterFaction {
    pub character: Option<String>,
    pub faction: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRelationship {
    pub from_character: Option<String>,
    pub to_character: Option<String>,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}
