//! In-memory snapshot of everything an adventure owns.
//!
//! Loaded in one pass by the store. It serves as the read model for prompt
//! rendering, and as the source for cloning a template into a run and for
//! template export.

use serde::{Deserialize, Serialize};

use crate::entities::{
    Adventure, AdventureEvent, Character, CharacterFaction, CharacterRelationship,
    CharacterSystem, CharacterTechnique, EventStatus, Faction, HeroSetup, Location, OtherInfo,
    Race, SkillSystem, Technique,
};
use crate::ids::{CharacterId, LocationId, RaceId, SkillSystemId, TechniqueId};

/// Cards are ordered by title, join records by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdventureGraph {
    pub adventure: Adventure,
    pub hero_setup: HeroSetup,
    pub locations: Vec<Location>,
    pub races: Vec<Race>,
    pub systems: Vec<SkillSystem>,
    pub techniques: Vec<Technique>,
    pub factions: Vec<Faction>,
    pub other_info: Vec<OtherInfo>,
    pub events: Vec<AdventureEvent>,
    pub characters: Vec<Character>,
    pub character_systems: Vec<CharacterSystem>,
    pub character_techniques: Vec<CharacterTechnique>,
    pub character_factions: Vec<CharacterFaction>,
    pub relationships: Vec<CharacterRelationship>,
}

impl AdventureGraph {
    /// A graph with no cards.
    pub fn empty(adventure: Adventure) -> Self {
        Self {
            adventure,
            hero_setup: HeroSetup::default(),
            locations: Vec::new(),
            races: Vec::new(),
            systems: Vec::new(),
            techniques: Vec::new(),
            factions: Vec::new(),
            other_info: Vec::new(),
            events: Vec::new(),
            characters: Vec::new(),
            character_systems: Vec::new(),
            character_techniques: Vec::new(),
            character_factions: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn race(&self, id: RaceId) -> Option<&Race> {
        self.races.iter().find(|r| r.id == id)
    }

    pub fn system(&self, id: SkillSystemId) -> Option<&SkillSystem> {
        self.systems.iter().find(|s| s.id == id)
    }

    pub fn technique(&self, id: TechniqueId) -> Option<&Technique> {
        self.techniques.iter().find(|t| t.id == id)
    }

    pub fn primary_hero(&self) -> Option<&Character> {
        self.adventure
            .primary_hero_id
            .and_then(|id| self.character(id))
    }

    /// Party members in title order.
    pub fn party(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter().filter(|c| c.in_party)
    }

    /// Characters standing at `location`, in title order.
    pub fn characters_at(&self, location: LocationId) -> impl Iterator<Item = &Character> {
        self.characters
            .iter()
            .filter(move |c| c.location_id == Some(location))
    }

    pub fn active_events(&self) -> impl Iterator<Item = &AdventureEvent> {
        self.events
            .iter()
            .filter(|e| e.status == EventStatus::Active)
    }

    pub fn systems_of(&self, character: CharacterId) -> impl Iterator<Item = &CharacterSystem> {
        self.character_systems
            .iter()
            .filter(move |cs| cs.character_id == character)
    }

    pub fn techniques_of(
        &self,
        character: CharacterId,
    ) -> impl Iterator<Item = &CharacterTechnique> {
        self.character_techniques
            .iter()
            .filter(move |ct| ct.character_id == character)
    }
}
