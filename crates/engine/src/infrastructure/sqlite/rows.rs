//! Row decoding and value encoding shared by the SQLite repositories.
//!
//! Timestamps are stored as RFC 3339 text, tags and metadata as JSON text and
//! user ids as UUID strings.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use taleweaver_domain::{
    Adventure, AdventureEvent, AdventureId, Character, CharacterFaction, CharacterFactionId,
    CharacterId, CharacterRelationship, CharacterSystem, CharacterSystemId, CharacterTechnique,
    CharacterTechniqueId, EventId, Faction, FactionId, HeroSetup, HistoryEntry, HistoryEntryId,
    Location, LocationId, OtherInfo, OtherInfoId, Race, RaceId, RelationshipId, SkillSystem,
    SkillSystemId, Technique, TechniqueId, UserId,
};
use uuid::Uuid;

use super::schema::CROSS_ADVENTURE_MARKER;
use crate::infrastructure::ports::RepoError;

/// Maps a driver error, separating constraint rejections from other failures.
pub(crate) fn store_error(operation: &'static str, error: sqlx::Error) -> RepoError {
    if let Some(db) = error.as_database_error() {
        let constraint = matches!(
            db.kind(),
            ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
        );
        if constraint || db.message().contains(CROSS_ADVENTURE_MARKER) {
            return RepoError::constraint(format!("{operation}: {}", db.message()));
        }
    }
    RepoError::database(operation, error)
}

pub(crate) fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339()
}

fn decode_time(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("invalid timestamp '{raw}': {e}")))
}

fn decode_user(raw: &str) -> Result<UserId, RepoError> {
    Uuid::parse_str(raw)
        .map(UserId::from_uuid)
        .map_err(|e| RepoError::serialization(format!("invalid user id '{raw}': {e}")))
}

pub(crate) fn encode_tags(tags: &[String]) -> Result<String, RepoError> {
    serde_json::to_string(tags).map_err(RepoError::serialization)
}

fn decode_tags(raw: &str) -> Result<Vec<String>, RepoError> {
    serde_json::from_str(raw).map_err(RepoError::serialization)
}

pub(crate) fn encode_metadata(metadata: &Map<String, Value>) -> Result<String, RepoError> {
    serde_json::to_string(metadata).map_err(RepoError::serialization)
}

fn decode_metadata(raw: &str) -> Result<Map<String, Value>, RepoError> {
    serde_json::from_str(raw).map_err(RepoError::serialization)
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, RepoError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|e| RepoError::serialization(format!("column {column}: {e}")))
}

fn get_id<T: From<i64>>(row: &SqliteRow, column: &str) -> Result<T, RepoError> {
    get::<i64>(row, column).map(T::from)
}

fn get_opt_id<T: From<i64>>(row: &SqliteRow, column: &str) -> Result<Option<T>, RepoError> {
    get::<Option<i64>>(row, column).map(|id| id.map(T::from))
}

pub(crate) const ADVENTURE_COLUMNS: &str = "id, author, player, template_id, is_template, \
     is_waiting_ai, rollback_min_history_id, primary_hero_id, title, description, intro, \
     spec_instructions, created_at";

pub(crate) fn adventure(row: &SqliteRow) -> Result<Adventure, RepoError> {
    let author: String = get(row, "author")?;
    let player: Option<String> = get(row, "player")?;
    let created_at: String = get(row, "created_at")?;
    Ok(Adventure {
        id: get_id::<AdventureId>(row, "id")?,
        author: decode_user(&author)?,
        player: player.as_deref().map(decode_user).transpose()?,
        template_id: get_opt_id::<AdventureId>(row, "template_id")?,
        is_template: get(row, "is_template")?,
        is_waiting_ai: get(row, "is_waiting_ai")?,
        rollback_min_history_id: get_opt_id::<HistoryEntryId>(row, "rollback_min_history_id")?,
        primary_hero_id: get_opt_id::<CharacterId>(row, "primary_hero_id")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        intro: get(row, "intro")?,
        spec_instructions: get(row, "spec_instructions")?,
        created_at: decode_time(&created_at)?,
    })
}

pub(crate) const HISTORY_COLUMNS: &str = "id, adventure_id, role, content, metadata, created_at";

pub(crate) fn history_entry(row: &SqliteRow) -> Result<HistoryEntry, RepoError> {
    let role: String = get(row, "role")?;
    let metadata: String = get(row, "metadata")?;
    let created_at: String = get(row, "created_at")?;
    Ok(HistoryEntry {
        id: get_id::<HistoryEntryId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        role: role.parse().map_err(RepoError::serialization)?,
        content: get(row, "content")?,
        metadata: decode_metadata(&metadata)?,
        created_at: decode_time(&created_at)?,
    })
}

pub(crate) fn hero_setup(row: &SqliteRow) -> Result<HeroSetup, RepoError> {
    Ok(HeroSetup {
        default_location_id: get_opt_id::<LocationId>(row, "default_location_id")?,
        require_race: get(row, "require_race")?,
        default_race_id: get_opt_id::<RaceId>(row, "default_race_id")?,
        require_age: get(row, "require_age")?,
        default_age: get(row, "default_age")?,
        require_body_power: get(row, "require_body_power")?,
        default_body_power: get(row, "default_body_power")?,
        require_mind_power: get(row, "require_mind_power")?,
        default_mind_power: get(row, "default_mind_power")?,
        require_will_power: get(row, "require_will_power")?,
        default_will_power: get(row, "default_will_power")?,
        require_systems: get(row, "require_systems")?,
        require_techniques: get(row, "require_techniques")?,
    })
}

pub(crate) fn location(row: &SqliteRow) -> Result<Location, RepoError> {
    let tags: String = get(row, "tags")?;
    Ok(Location {
        id: get_id::<LocationId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        x: get(row, "x")?,
        y: get(row, "y")?,
        width: get(row, "width")?,
        height: get(row, "height")?,
        tags: decode_tags(&tags)?,
    })
}

pub(crate) fn race(row: &SqliteRow) -> Result<Race, RepoError> {
    let tags: String = get(row, "tags")?;
    Ok(Race {
        id: get_id::<RaceId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        life_span: get(row, "life_span")?,
        tags: decode_tags(&tags)?,
    })
}

pub(crate) fn skill_system(row: &SqliteRow) -> Result<SkillSystem, RepoError> {
    let tags: String = get(row, "tags")?;
    Ok(SkillSystem {
        id: get_id::<SkillSystemId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        w_body: get(row, "w_body")?,
        w_mind: get(row, "w_mind")?,
        w_will: get(row, "w_will")?,
        formula_hint: get(row, "formula_hint")?,
        tags: decode_tags(&tags)?,
    })
}

pub(crate) fn technique(row: &SqliteRow) -> Result<Technique, RepoError> {
    let tags: String = get(row, "tags")?;
    Ok(Technique {
        id: get_id::<TechniqueId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        system_id: get_id::<SkillSystemId>(row, "system_id")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        difficulty: get(row, "difficulty")?,
        tier: get(row, "tier")?,
        required_system_level: get(row, "required_system_level")?,
        tags: decode_tags(&tags)?,
    })
}

pub(crate) fn faction(row: &SqliteRow) -> Result<Faction, RepoError> {
    let tags: String = get(row, "tags")?;
    Ok(Faction {
        id: get_id::<FactionId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        tags: decode_tags(&tags)?,
    })
}

pub(crate) fn other_info(row: &SqliteRow) -> Result<OtherInfo, RepoError> {
    let tags: String = get(row, "tags")?;
    Ok(OtherInfo {
        id: get_id::<OtherInfoId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        category: get(row, "category")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        tags: decode_tags(&tags)?,
    })
}

pub(crate) fn event(row: &SqliteRow) -> Result<AdventureEvent, RepoError> {
    let status: String = get(row, "status")?;
    Ok(AdventureEvent {
        id: get_id::<EventId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        location_id: get_opt_id::<LocationId>(row, "location_id")?,
        status: status.parse().map_err(RepoError::serialization)?,
        title: get(row, "title")?,
        trigger_hint: get(row, "trigger_hint")?,
        state: get(row, "state")?,
    })
}

pub(crate) fn character(row: &SqliteRow) -> Result<Character, RepoError> {
    let tags: String = get(row, "tags")?;
    Ok(Character {
        id: get_id::<CharacterId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        race_id: get_opt_id::<RaceId>(row, "race_id")?,
        location_id: get_opt_id::<LocationId>(row, "location_id")?,
        is_player: get(row, "is_player")?,
        in_party: get(row, "in_party")?,
        title: get(row, "title")?,
        description: get(row, "description")?,
        age: get(row, "age")?,
        body_power: get(row, "body_power")?,
        body_power_progress: get(row, "body_power_progress")?,
        mind_power: get(row, "mind_power")?,
        mind_power_progress: get(row, "mind_power_progress")?,
        will_power: get(row, "will_power")?,
        will_power_progress: get(row, "will_power_progress")?,
        tags: decode_tags(&tags)?,
    })
}

pub(crate) fn character_system(row: &SqliteRow) -> Result<CharacterSystem, RepoError> {
    Ok(CharacterSystem {
        id: get_id::<CharacterSystemId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        character_id: get_id::<CharacterId>(row, "character_id")?,
        system_id: get_id::<SkillSystemId>(row, "system_id")?,
        level: get(row, "level")?,
        progress_percent: get(row, "progress_percent")?,
        notes: get(row, "notes")?,
    })
}

pub(crate) fn character_technique(row: &SqliteRow) -> Result<CharacterTechnique, RepoError> {
    let learned_at: String = get(row, "learned_at")?;
    Ok(CharacterTechnique {
        id: get_id::<CharacterTechniqueId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        character_id: get_id::<CharacterId>(row, "character_id")?,
        technique_id: get_id::<TechniqueId>(row, "technique_id")?,
        notes: get(row, "notes")?,
        learned_at: decode_time(&learned_at)?,
    })
}

pub(crate) fn character_faction(row: &SqliteRow) -> Result<CharacterFaction, RepoError> {
    Ok(CharacterFaction {
        id: get_id::<CharacterFactionId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        character_id: get_id::<CharacterId>(row, "character_id")?,
        faction_id: get_id::<FactionId>(row, "faction_id")?,
        role: get(row, "role")?,
        notes: get(row, "notes")?,
    })
}

pub(crate) fn relationship(row: &SqliteRow) -> Result<CharacterRelationship, RepoError> {
    Ok(CharacterRelationship {
        id: get_id::<RelationshipId>(row, "id")?,
        adventure_id: get_id::<AdventureId>(row, "adventure_id")?,
        from_character_id: get_id::<CharacterId>(row, "from_character_id")?,
        to_character_id: get_id::<CharacterId>(row, "to_character_id")?,
        kind: get(row, "kind")?,
        description: get(row, "description")?,
    })
}
