//! Partial card updates, always scoped to one adventure.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use taleweaver_domain::{
    AdventureId, CharacterId, CharacterPatch, CharacterSystem, CharacterSystemId,
    CharacterSystemPatch, CharacterTechniqueId, EventId, EventPatch,
};

use super::rows::{self, store_error};
use super::SqliteStore;
use crate::infrastructure::ports::{CardRepo, RepoError};

impl SqliteStore {
    async fn exists(
        &self,
        table: &'static str,
        adventure: AdventureId,
        id: i64,
    ) -> Result<bool, RepoError> {
        let sql = format!("SELECT 1 FROM {table} WHERE adventure_id = ? AND id = ?");
        let row = sqlx::query(&sql)
            .bind(adventure.get())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("cards.exists", e))?;
        Ok(row.is_some())
    }

    /// Finishes an `UPDATE ... SET` with the adventure scope and runs it.
    async fn run_scoped_update(
        &self,
        mut query: QueryBuilder<'_, Sqlite>,
        adventure: AdventureId,
        id: i64,
        operation: &'static str,
    ) -> Result<bool, RepoError> {
        query
            .push(" WHERE adventure_id = ")
            .push_bind(adventure.get())
            .push(" AND id = ")
            .push_bind(id);
        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| store_error(operation, e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CardRepo for SqliteStore {
    async fn update_event(
        &self,
        adventure: AdventureId,
        id: EventId,
        patch: &EventPatch,
    ) -> Result<bool, RepoError> {
        if patch.is_empty() {
            return self.exists("adventure_events", adventure, id.get()).await;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE adventure_events SET ");
        {
            let mut set = query.separated(", ");
            if let Some(status) = patch.status {
                set.push("status = ").push_bind_unseparated(status.as_str());
            }
            if let Some(state) = &patch.state {
                set.push("state = ").push_bind_unseparated(state.clone());
            }
        }
        self.run_scoped_update(query, adventure, id.get(), "cards.update_event")
            .await
    }

    async fn update_character(
        &self,
        adventure: AdventureId,
        id: CharacterId,
        patch: &CharacterPatch,
    ) -> Result<bool, RepoError> {
        if patch.is_empty() {
            return self.exists("characters", adventure, id.get()).await;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE characters SET ");
        {
            let mut set = query.separated(", ");
            if let Some(description) = &patch.description {
                set.push("description = ")
                    .push_bind_unseparated(description.clone());
            }
            for (column, value) in [
                ("body_power", patch.body_power),
                ("mind_power", patch.mind_power),
                ("will_power", patch.will_power),
                ("body_power_progress", patch.body_power_progress),
                ("mind_power_progress", patch.mind_power_progress),
                ("will_power_progress", patch.will_power_progress),
            ] {
                if let Some(value) = value {
                    set.push(format!("{column} = ")).push_bind_unseparated(value);
                }
            }
        }
        self.run_scoped_update(query, adventure, id.get(), "cards.update_character")
            .await
    }

    async fn get_character_system(
        &self,
        adventure: AdventureId,
        id: CharacterSystemId,
    ) -> Result<Option<CharacterSystem>, RepoError> {
        sqlx::query(
            "SELECT id, adventure_id, character_id, system_id, level, progress_percent, notes \
             FROM character_systems WHERE adventure_id = ? AND id = ?",
        )
        .bind(adventure.get())
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("cards.get_character_system", e))?
        .as_ref()
        .map(rows::character_system)
        .transpose()
    }

    async fn update_character_system(
        &self,
        adventure: AdventureId,
        id: CharacterSystemId,
        patch: &CharacterSystemPatch,
    ) -> Result<bool, RepoError> {
        if patch.is_empty() {
            return self
                .exists("character_systems", adventure, id.get())
                .await;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE character_systems SET ");
        {
            let mut set = query.separated(", ");
            if let Some(level) = patch.level {
                set.push("level = ").push_bind_unseparated(level);
            }
            if let Some(progress) = patch.progress_percent {
                set.push("progress_percent = ")
                    .push_bind_unseparated(progress);
            }
            if let Some(notes) = &patch.notes {
                set.push("notes = ").push_bind_unseparated(notes.clone());
            }
        }
        self.run_scoped_update(query, adventure, id.get(), "cards.update_character_system")
            .await
    }

    async fn update_character_technique_notes(
        &self,
        adventure: AdventureId,
        id: CharacterTechniqueId,
        notes: &str,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE character_techniques SET notes = ? WHERE adventure_id = ? AND id = ?",
        )
        .bind(notes)
        .bind(adventure.get())
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("cards.update_character_technique", e))?;
        Ok(result.rows_affected() > 0)
    }
}
