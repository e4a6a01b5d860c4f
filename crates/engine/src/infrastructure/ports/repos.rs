//! Repository port traits for database access.

use async_trait::async_trait;
use taleweaver_domain::{
    Adventure, AdventureEvent, AdventureGraph, AdventureId, Character, CharacterFaction,
    CharacterFactionId, CharacterId, CharacterPatch, CharacterRelationship, CharacterSystem,
    CharacterSystemId, CharacterSystemPatch, CharacterTechnique, CharacterTechniqueId, EventId,
    EventPatch, Faction, FactionId, HeroSetup, HistoryEntry, HistoryEntryId, Location,
    LocationId, NewAdventure, NewHistoryEntry, OtherInfo, OtherInfoId, Race, RaceId,
    RelationshipId, SkillSystem, SkillSystemId, Technique, TechniqueId, UserId,
};

use super::error::RepoError;

// =============================================================================
// Adventures
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdventureRepo: Send + Sync {
    async fn get(&self, id: AdventureId) -> Result<Option<Adventure>, RepoError>;
    async fn list_templates(&self) -> Result<Vec<Adventure>, RepoError>;
    /// Runs owned by `player`, newest first.
    async fn list_runs(&self, player: UserId) -> Result<Vec<Adventure>, RepoError>;
    /// Deletes the adventure and everything it owns. Returns false if it did
    /// not exist.
    async fn delete(&self, id: AdventureId) -> Result<bool, RepoError>;

    /// Opens a transaction holding the exclusive row lock of the adventure.
    ///
    /// Fails with `NotFound` if the adventure does not exist.
    async fn lock(&self, id: AdventureId) -> Result<Box<dyn AdventureLock>, RepoError>;

    /// Writes the AI latch in its own transaction.
    async fn set_waiting_ai(&self, id: AdventureId, waiting: bool) -> Result<(), RepoError>;
    /// Clears every AI latch. Returns how many were set.
    async fn reset_stale_waiting_flags(&self) -> Result<u64, RepoError>;
    /// Moves the rollback watermark up to `floor`. A lower `floor` than the
    /// stored one is ignored.
    async fn advance_rollback_floor(
        &self,
        id: AdventureId,
        floor: HistoryEntryId,
    ) -> Result<(), RepoError>;
}

/// An open transaction holding an adventure's row lock.
///
/// Dropping it without [`AdventureLock::commit`] rolls every write back.
#[async_trait]
pub trait AdventureLock: Send {
    /// The adventure as read under the lock.
    fn adventure(&self) -> &Adventure;
    async fn set_waiting_ai(&mut self, waiting: bool) -> Result<(), RepoError>;
    async fn history_entry(
        &mut self,
        id: HistoryEntryId,
    ) -> Result<Option<HistoryEntry>, RepoError>;
    async fn last_history_entry(&mut self) -> Result<Option<HistoryEntry>, RepoError>;
    /// Deletes every entry newer than `id`. Returns the number deleted.
    async fn delete_history_after(&mut self, id: HistoryEntryId) -> Result<u64, RepoError>;
    async fn delete_history_entry(&mut self, id: HistoryEntryId) -> Result<(), RepoError>;
    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}

// =============================================================================
// History
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryRepo: Send + Sync {
    /// All entries of the adventure, ordered by id ascending.
    async fn list(&self, adventure: AdventureId) -> Result<Vec<HistoryEntry>, RepoError>;
    async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, RepoError>;
}

// =============================================================================
// Cards (partial updates scoped to one adventure)
// =============================================================================

/// Every method is scoped to `adventure`: records of other adventures are
/// treated as missing. Update methods return false when the record was not
/// found.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CardRepo: Send + Sync {
    async fn update_event(
        &self,
        adventure: AdventureId,
        id: EventId,
        patch: &EventPatch,
    ) -> Result<bool, RepoError>;
    async fn update_character(
        &self,
        adventure: AdventureId,
        id: CharacterId,
        patch: &CharacterPatch,
    ) -> Result<bool, RepoError>;
    async fn get_character_system(
        &self,
        adventure: AdventureId,
        id: CharacterSystemId,
    ) -> Result<Option<CharacterSystem>, RepoError>;
    async fn update_character_system(
        &self,
        adventure: AdventureId,
        id: CharacterSystemId,
        patch: &CharacterSystemPatch,
    ) -> Result<bool, RepoError>;
    async fn update_character_technique_notes(
        &self,
        adventure: AdventureId,
        id: CharacterTechniqueId,
        notes: &str,
    ) -> Result<bool, RepoError>;
}

// =============================================================================
// Whole-graph access
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphRepo: Send + Sync {
    async fn load(&self, id: AdventureId) -> Result<Option<AdventureGraph>, RepoError>;
    /// Opens a write transaction for materialising a graph.
    async fn begin_write(&self) -> Result<Box<dyn GraphWriter>, RepoError>;
}

/// Transactional writer used to create an adventure and its cards.
///
/// `create_*` methods insert the given record under `adventure`, ignoring its
/// `id` and `adventure_id`; every other reference must already point at a
/// record of `adventure`. Dropping the writer without
/// [`GraphWriter::commit`] discards everything written.
#[async_trait]
pub trait GraphWriter: Send {
    /// Reads a graph inside this transaction.
    async fn load(&mut self, id: AdventureId) -> Result<Option<AdventureGraph>, RepoError>;

    async fn create_adventure(&mut self, adventure: &NewAdventure)
        -> Result<AdventureId, RepoError>;
    async fn save_hero_setup(
        &mut self,
        adventure: AdventureId,
        setup: &HeroSetup,
    ) -> Result<(), RepoError>;
    async fn create_location(
        &mut self,
        adventure: AdventureId,
        location: &Location,
    ) -> Result<LocationId, RepoError>;
    async fn create_race(&mut self, adventure: AdventureId, race: &Race)
        -> Result<RaceId, RepoError>;
    async fn create_system(
        &mut self,
        adventure: AdventureId,
        system: &SkillSystem,
    ) -> Result<SkillSystemId, RepoError>;
    async fn create_technique(
        &mut self,
        adventure: AdventureId,
        technique: &Technique,
    ) -> Result<TechniqueId, RepoError>;
    async fn create_faction(
        &mut self,
        adventure: AdventureId,
        faction: &Faction,
    ) -> Result<FactionId, RepoError>;
    async fn create_other_info(
        &mut self,
        adventure: AdventureId,
        info: &OtherInfo,
    ) -> Result<OtherInfoId, RepoError>;
    async fn create_event(
        &mut self,
        adventure: AdventureId,
        event: &AdventureEvent,
    ) -> Result<EventId, RepoError>;
    async fn create_character(
        &mut self,
        adventure: AdventureId,
        character: &Character,
    ) -> Result<CharacterId, RepoError>;
    async fn create_character_system(
        &mut self,
        adventure: AdventureId,
        record: &CharacterSystem,
    ) -> Result<CharacterSystemId, RepoError>;
    async fn create_character_technique(
        &mut self,
        adventure: AdventureId,
        record: &CharacterTechnique,
    ) -> Result<CharacterTechniqueId, RepoError>;
    async fn create_character_faction(
        &mut self,
        adventure: AdventureId,
        record: &CharacterFaction,
    ) -> Result<CharacterFactionId, RepoError>;
    async fn create_relationship(
        &mut self,
        adventure: AdventureId,
        record: &CharacterRelationship,
    ) -> Result<RelationshipId, RepoError>;

    async fn set_primary_hero(
        &mut self,
        adventure: AdventureId,
        hero: CharacterId,
    ) -> Result<(), RepoError>;
    async fn set_in_party(&mut self, character: CharacterId) -> Result<(), RepoError>;
    async fn append_history(&mut self, entry: &NewHistoryEntry)
        -> Result<HistoryEntry, RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}
