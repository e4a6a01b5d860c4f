//! Domain model of the adventure engine: entities, the history window policy
//! and card update decoding. No I/O.

pub mod card_update;
pub mod entities;
pub mod error;
pub mod graph;
pub mod history_window;
pub mod ids;

pub use card_update::{
    coerce_int, extract_json_object, CardUpdatePayload, CharacterPatch, CharacterSystemPatch,
    CharacterSystemUpdate, CharacterTechniqueUpdate, CharacterUpdate, EventPatch, EventUpdate,
};
pub use entities::{
    clamp_progress, render_intro, Adventure, AdventureEvent, Character, CharacterFaction,
    CharacterRelationship, CharacterSystem, CharacterTechnique, EventStatus, Faction, HeroSetup,
    HistoryEntry, HistoryRole, Location, NewAdventure, NewHistoryEntry, OtherInfo, Race,
    SkillSystem, Technique, DEFAULT_LIFE_SPAN, MAIN_HERO_PLACEHOLDER, MAX_PROGRESS,
};
pub use error::{DomainError, DomainResult};
pub use graph::AdventureGraph;
pub use history_window::{plan_window, HistoryLimits, WindowPlan};
pub use ids::{
    AdventureId, CharacterFactionId, CharacterId, CharacterSystemId, CharacterTechniqueId,
    EventId, FactionId, HistoryEntryId, LocationId, OtherInfoId, RaceId, RelationshipId,
    SkillSystemId, TechniqueId, UserId,
};
