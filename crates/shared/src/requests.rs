//! Request bodies.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/runs/{id}/history/hero-prompt`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroPromptRequest {
    #[serde(default)]
    pub content: Option<String>,
}

/// Body of `POST /api/runs/{id}/hero`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateHeroRequest {
    #[serde(default)]
    pub hero: HeroData,
    /// Existing location of the run to start in.
    #[serde(default)]
    pub location_id: Option<i64>,
    /// Title of a new location, used when no location id is given.
    #[serde(default)]
    pub location_title: Option<String>,
    #[serde(default)]
    pub location_description: Option<String>,
    #[serde(default)]
    pub systems: Vec<HeroSystemChoice>,
    #[serde(default)]
    pub techniques: Vec<HeroTechniqueChoice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub race: Option<i64>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub body_power: Option<i64>,
    #[serde(default)]
    pub mind_power: Option<i64>,
    #[serde(default)]
    pub will_power: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroSystemChoice {
    pub system: i64,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub progress_percent: i64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroTechniqueChoice {
    pub technique: i64,
    #[serde(default)]
    pub notes: String,
}
