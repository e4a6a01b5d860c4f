//! Entities owned by an adventure.

mod adventure;
mod affiliation;
mod character;
mod event;
mod hero_setup;
mod history;
mod skill_system;
mod world;

pub use adventure::{render_intro, Adventure, NewAdventure, MAIN_HERO_PLACEHOLDER};
pub use affiliation::{CharacterFaction, CharacterRelationship};
pub use character::{clamp_progress, Character, MAX_PROGRESS};
pub use event::{AdventureEvent, EventStatus};
pub use hero_setup::HeroSetup;
pub use history::{HistoryEntry, HistoryRole, NewHistoryEntry};
pub use skill_system::{CharacterSystem, CharacterTechnique, SkillSystem, Technique};
pub use world::{Faction, Location, OtherInfo, Race, DEFAULT_LIFE_SPAN};
