//! Whole-graph reads and the transactional graph writer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use taleweaver_domain::{
    AdventureEvent, AdventureGraph, AdventureId, Character, CharacterFaction, CharacterFactionId,
    CharacterId, CharacterRelationship, CharacterSystem, CharacterSystemId, CharacterTechnique,
    CharacterTechniqueId, EventId, Faction, FactionId, HeroSetup, HistoryEntry, Location,
    LocationId, NewAdventure, NewHistoryEntry, OtherInfo, OtherInfoId, Race, RaceId,
    RelationshipId, SkillSystem, SkillSystemId, Technique, TechniqueId,
};

use super::rows::{self, encode_tags, encode_time, store_error};
use super::{adventures, history, SqliteStore};
use crate::infrastructure::ports::{GraphRepo, GraphWriter, RepoError};

async fn fetch_cards<T>(
    conn: &mut SqliteConnection,
    table: &'static str,
    adventure: AdventureId,
    decode: fn(&SqliteRow) -> Result<T, RepoError>,
) -> Result<Vec<T>, RepoError> {
    let sql = format!("SELECT * FROM {table} WHERE adventure_id = ? ORDER BY id ASC");
    sqlx::query(&sql)
        .bind(adventure.get())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| store_error("graph.load", e))?
        .iter()
        .map(decode)
        .collect()
}

/// Reads an adventure and every card it owns.
pub(crate) async fn load(
    conn: &mut SqliteConnection,
    id: AdventureId,
) -> Result<Option<AdventureGraph>, RepoError> {
    let Some(adventure) = adventures::get(conn, id).await? else {
        return Ok(None);
    };

    let hero_setup = sqlx::query("SELECT * FROM hero_setups WHERE adventure_id = ?")
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| store_error("graph.load", e))?
        .as_ref()
        .map(rows::hero_setup)
        .transpose()?
        .unwrap_or_default();

    Ok(Some(AdventureGraph {
        adventure,
        hero_setup,
        locations: fetch_cards(conn, "locations", id, rows::location).await?,
        races: fetch_cards(conn, "races", id, rows::race).await?,
        systems: fetch_cards(conn, "skill_systems", id, rows::skill_system).await?,
        techniques: fetch_cards(conn, "techniques", id, rows::technique).await?,
        factions: fetch_cards(conn, "factions", id, rows::faction).await?,
        other_info: fetch_cards(conn, "other_info", id, rows::other_info).await?,
        events: fetch_cards(conn, "adventure_events", id, rows::event).await?,
        characters: fetch_cards(conn, "characters", id, rows::character).await?,
        character_systems: fetch_cards(conn, "character_systems", id, rows::character_system)
            .await?,
        character_techniques: fetch_cards(
            conn,
            "character_techniques",
            id,
            rows::character_technique,
        )
        .await?,
        character_factions: fetch_cards(conn, "character_factions", id, rows::character_faction)
            .await?,
        relationships: fetch_cards(conn, "character_relationships", id, rows::relationship)
            .await?,
    }))
}

#[async_trait]
impl GraphRepo for SqliteStore {
    async fn load(&self, id: AdventureId) -> Result<Option<AdventureGraph>, RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("graph.load", e))?;
        load(&mut conn, id).await
    }

    async fn begin_write(&self) -> Result<Box<dyn GraphWriter>, RepoError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("graph.begin_write", e))?;
        Ok(Box::new(SqliteGraphWriter {
            tx,
            now: self.clock.now(),
        }))
    }
}

/// Graph writer over one SQLite transaction. Every row written shares one
/// timestamp taken when the transaction began.
pub struct SqliteGraphWriter {
    tx: Transaction<'static, Sqlite>,
    now: DateTime<Utc>,
}

impl SqliteGraphWriter {
    fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }
}

#[async_trait]
impl GraphWriter for SqliteGraphWriter {
    async fn load(&mut self, id: AdventureId) -> Result<Option<AdventureGraph>, RepoError> {
        load(self.conn(), id).await
    }

    async fn create_adventure(
        &mut self,
        adventure: &NewAdventure,
    ) -> Result<AdventureId, RepoError> {
        let now = encode_time(self.now);
        let result = sqlx::query(
            "INSERT INTO adventures (author, player, template_id, is_template, title, \
             description, intro, spec_instructions, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(adventure.author().to_string())
        .bind(adventure.player().map(|p| p.to_string()))
        .bind(adventure.template_id().map(AdventureId::get))
        .bind(adventure.is_template())
        .bind(&adventure.title)
        .bind(&adventure.description)
        .bind(&adventure.intro)
        .bind(&adventure.spec_instructions)
        .bind(now)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_adventure", e))?;
        Ok(AdventureId::new(result.last_insert_rowid()))
    }

    async fn save_hero_setup(
        &mut self,
        adventure: AdventureId,
        setup: &HeroSetup,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO hero_setups (adventure_id, default_location_id, require_race, \
             default_race_id, require_age, default_age, require_body_power, default_body_power, \
             require_mind_power, default_mind_power, require_will_power, default_will_power, \
             require_systems, require_techniques) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(adventure_id) DO UPDATE SET \
                default_location_id = excluded.default_location_id, \
                require_race = excluded.require_race, \
                default_race_id = excluded.default_race_id, \
                require_age = excluded.require_age, \
                default_age = excluded.default_age, \
                require_body_power = excluded.require_body_power, \
                default_body_power = excluded.default_body_power, \
                require_mind_power = excluded.require_mind_power, \
                default_mind_power = excluded.default_mind_power, \
                require_will_power = excluded.require_will_power, \
                default_will_power = excluded.default_will_power, \
                require_systems = excluded.require_systems, \
                require_techniques = excluded.require_techniques",
        )
        .bind(adventure.get())
        .bind(setup.default_location_id.map(LocationId::get))
        .bind(setup.require_race)
        .bind(setup.default_race_id.map(RaceId::get))
        .bind(setup.require_age)
        .bind(setup.default_age)
        .bind(setup.require_body_power)
        .bind(setup.default_body_power)
        .bind(setup.require_mind_power)
        .bind(setup.default_mind_power)
        .bind(setup.require_will_power)
        .bind(setup.default_will_power)
        .bind(setup.require_systems)
        .bind(setup.require_techniques)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.save_hero_setup", e))?;
        Ok(())
    }

    async fn create_location(
        &mut self,
        adventure: AdventureId,
        location: &Location,
    ) -> Result<LocationId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO locations (adventure_id, title, description, x, y, width, height, tags) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(&location.title)
        .bind(&location.description)
        .bind(location.x)
        .bind(location.y)
        .bind(location.width)
        .bind(location.height)
        .bind(encode_tags(&location.tags)?)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_location", e))?;
        Ok(LocationId::new(result.last_insert_rowid()))
    }

    async fn create_race(
        &mut self,
        adventure: AdventureId,
        race: &Race,
    ) -> Result<RaceId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO races (adventure_id, title, description, life_span, tags) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(&race.title)
        .bind(&race.description)
        .bind(race.life_span)
        .bind(encode_tags(&race.tags)?)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_race", e))?;
        Ok(RaceId::new(result.last_insert_rowid()))
    }

    async fn create_system(
        &mut self,
        adventure: AdventureId,
        system: &SkillSystem,
    ) -> Result<SkillSystemId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO skill_systems (adventure_id, title, description, w_body, w_mind, \
             w_will, formula_hint, tags) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(&system.title)
        .bind(&system.description)
        .bind(system.w_body)
        .bind(system.w_mind)
        .bind(system.w_will)
        .bind(&system.formula_hint)
        .bind(encode_tags(&system.tags)?)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_system", e))?;
        Ok(SkillSystemId::new(result.last_insert_rowid()))
    }

    async fn create_technique(
        &mut self,
        adventure: AdventureId,
        technique: &Technique,
    ) -> Result<TechniqueId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO techniques (adventure_id, system_id, title, description, difficulty, \
             tier, required_system_level, tags) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(technique.system_id.get())
        .bind(&technique.title)
        .bind(&technique.description)
        .bind(technique.difficulty)
        .bind(technique.tier)
        .bind(technique.required_system_level)
        .bind(encode_tags(&technique.tags)?)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_technique", e))?;
        Ok(TechniqueId::new(result.last_insert_rowid()))
    }

    async fn create_faction(
        &mut self,
        adventure: AdventureId,
        faction: &Faction,
    ) -> Result<FactionId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO factions (adventure_id, title, description, tags) VALUES (?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(&faction.title)
        .bind(&faction.description)
        .bind(encode_tags(&faction.tags)?)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_faction", e))?;
        Ok(FactionId::new(result.last_insert_rowid()))
    }

    async fn create_other_info(
        &mut self,
        adventure: AdventureId,
        info: &OtherInfo,
    ) -> Result<OtherInfoId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO other_info (adventure_id, category, title, description, tags) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(&info.category)
        .bind(&info.title)
        .bind(&info.description)
        .bind(encode_tags(&info.tags)?)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_other_info", e))?;
        Ok(OtherInfoId::new(result.last_insert_rowid()))
    }

    async fn create_event(
        &mut self,
        adventure: AdventureId,
        event: &AdventureEvent,
    ) -> Result<EventId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO adventure_events (adventure_id, location_id, status, title, \
             trigger_hint, state) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(event.location_id.map(LocationId::get))
        .bind(event.status.as_str())
        .bind(&event.title)
        .bind(&event.trigger_hint)
        .bind(&event.state)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_event", e))?;
        Ok(EventId::new(result.last_insert_rowid()))
    }

    async fn create_character(
        &mut self,
        adventure: AdventureId,
        character: &Character,
    ) -> Result<CharacterId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO characters (adventure_id, race_id, location_id, is_player, in_party, \
             title, description, age, body_power, body_power_progress, mind_power, \
             mind_power_progress, will_power, will_power_progress, tags) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(character.race_id.map(RaceId::get))
        .bind(character.location_id.map(LocationId::get))
        .bind(character.is_player)
        .bind(character.in_party)
        .bind(&character.title)
        .bind(&character.description)
        .bind(character.age)
        .bind(character.body_power)
        .bind(character.body_power_progress)
        .bind(character.mind_power)
        .bind(character.mind_power_progress)
        .bind(character.will_power)
        .bind(character.will_power_progress)
        .bind(encode_tags(&character.tags)?)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_character", e))?;
        Ok(CharacterId::new(result.last_insert_rowid()))
    }

    async fn create_character_system(
        &mut self,
        adventure: AdventureId,
        record: &CharacterSystem,
    ) -> Result<CharacterSystemId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO character_systems (adventure_id, character_id, system_id, level, \
             progress_percent, notes) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(record.character_id.get())
        .bind(record.system_id.get())
        .bind(record.level)
        .bind(record.progress_percent)
        .bind(&record.notes)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_character_system", e))?;
        Ok(CharacterSystemId::new(result.last_insert_rowid()))
    }

    async fn create_character_technique(
        &mut self,
        adventure: AdventureId,
        record: &CharacterTechnique,
    ) -> Result<CharacterTechniqueId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO character_techniques (adventure_id, character_id, technique_id, notes, \
             learned_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(record.character_id.get())
        .bind(record.technique_id.get())
        .bind(&record.notes)
        .bind(encode_time(record.learned_at))
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_character_technique", e))?;
        Ok(CharacterTechniqueId::new(result.last_insert_rowid()))
    }

    async fn create_character_faction(
        &mut self,
        adventure: AdventureId,
        record: &CharacterFaction,
    ) -> Result<CharacterFactionId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO character_factions (adventure_id, character_id, faction_id, role, notes) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(record.character_id.get())
        .bind(record.faction_id.get())
        .bind(&record.role)
        .bind(&record.notes)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_character_faction", e))?;
        Ok(CharacterFactionId::new(result.last_insert_rowid()))
    }

    async fn create_relationship(
        &mut self,
        adventure: AdventureId,
        record: &CharacterRelationship,
    ) -> Result<RelationshipId, RepoError> {
        let result = sqlx::query(
            "INSERT INTO character_relationships (adventure_id, from_character_id, \
             to_character_id, kind, description) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(adventure.get())
        .bind(record.from_character_id.get())
        .bind(record.to_character_id.get())
        .bind(&record.kind)
        .bind(&record.description)
        .execute(self.conn())
        .await
        .map_err(|e| store_error("graph.create_relationship", e))?;
        Ok(RelationshipId::new(result.last_insert_rowid()))
    }

    async fn set_primary_hero(
        &mut self,
        adventure: AdventureId,
        hero: CharacterId,
    ) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE adventures SET primary_hero_id = ? WHERE id = ?")
            .bind(hero.get())
            .bind(adventure.get())
            .execute(self.conn())
            .await
            .map_err(|e| store_error("graph.set_primary_hero", e))?;
        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Adventure", adventure));
        }
        Ok(())
    }

    async fn set_in_party(&mut self, character: CharacterId) -> Result<(), RepoError> {
        sqlx::query("UPDATE characters SET in_party = 1 WHERE id = ?")
            .bind(character.get())
            .execute(self.conn())
            .await
            .map_err(|e| store_error("graph.set_in_party", e))?;
        Ok(())
    }

    async fn append_history(
        &mut self,
        entry: &NewHistoryEntry,
    ) -> Result<HistoryEntry, RepoError> {
        let now = self.now;
        history::append(self.conn(), entry, now).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepoError::database("graph.commit", e))
    }
}
