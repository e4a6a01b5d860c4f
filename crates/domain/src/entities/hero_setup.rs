//! Hero setup - author-side rules for creating a run's primary hero.

use serde::{Deserialize, Serialize};

use crate::ids::{LocationId, RaceId};

/// Which hero fields a player must provide, and fallbacks for the rest.
///
/// Exactly one per adventure. Missing rows are treated as
/// [`HeroSetup::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroSetup {
    pub default_location_id: Option<LocationId>,
    pub require_race: bool,
    pub default_race_id: Option<RaceId>,
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

impl Default for HeroSetup {
    fn default() -> Self {
        Self {
            default_location_id: None,
            require_race: true,
            default_race_id: None,
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
