//! Adventures, the AI latch and the per-adventure row lock.

use async_trait::async_trait;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use taleweaver_domain::{Adventure, AdventureId, HistoryEntry, HistoryEntryId, UserId};

use super::rows::{self, store_error, ADVENTURE_COLUMNS};
use super::{history, SqliteStore};
use crate::infrastructure::ports::{AdventureLock, AdventureRepo, RepoError};

pub(crate) async fn get(
    conn: &mut SqliteConnection,
    id: AdventureId,
) -> Result<Option<Adventure>, RepoError> {
    let sql = format!("SELECT {ADVENTURE_COLUMNS} FROM adventures WHERE id = ?");
    sqlx::query(&sql)
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| store_error("adventures.get", e))?
        .as_ref()
        .map(rows::adventure)
        .transpose()
}

async fn write_waiting_ai(
    conn: &mut SqliteConnection,
    id: AdventureId,
    waiting: bool,
) -> Result<(), RepoError> {
    sqlx::query("UPDATE adventures SET is_waiting_ai = ? WHERE id = ?")
        .bind(waiting)
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| store_error("adventures.set_waiting_ai", e))?;
    Ok(())
}

#[async_trait]
impl AdventureRepo for SqliteStore {
    async fn get(&self, id: AdventureId) -> Result<Option<Adventure>, RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("adventures.get", e))?;
        get(&mut conn, id).await
    }

    async fn list_templates(&self) -> Result<Vec<Adventure>, RepoError> {
        let sql = format!(
            "SELECT {ADVENTURE_COLUMNS} FROM adventures WHERE is_template = 1 ORDER BY id ASC"
        );
        sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("adventures.list_templates", e))?
            .iter()
            .map(rows::adventure)
            .collect()
    }

    async fn list_runs(&self, player: UserId) -> Result<Vec<Adventure>, RepoError> {
        let sql = format!(
            "SELECT {ADVENTURE_COLUMNS} FROM adventures WHERE is_template = 0 AND player = ? \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query(&sql)
            .bind(player.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("adventures.list_runs", e))?
            .iter()
            .map(rows::adventure)
            .collect()
    }

    async fn delete(&self, id: AdventureId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM adventures WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("adventures.delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn lock(&self, id: AdventureId) -> Result<Box<dyn AdventureLock>, RepoError> {
        let lock = SqliteAdventureLock::acquire(self, id).await?;
        Ok(Box::new(lock))
    }

    async fn set_waiting_ai(&self, id: AdventureId, waiting: bool) -> Result<(), RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("adventures.set_waiting_ai", e))?;
        write_waiting_ai(&mut conn, id, waiting).await
    }

    async fn reset_stale_waiting_flags(&self) -> Result<u64, RepoError> {
        let result = sqlx::query("UPDATE adventures SET is_waiting_ai = 0 WHERE is_waiting_ai = 1")
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("adventures.reset_waiting_ai", e))?;
        Ok(result.rows_affected())
    }

    async fn advance_rollback_floor(
        &self,
        id: AdventureId,
        floor: HistoryEntryId,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE adventures \
             SET rollback_min_history_id = MAX(COALESCE(rollback_min_history_id, 0), ?) \
             WHERE id = ?",
        )
        .bind(floor.get())
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("adventures.advance_rollback_floor", e))?;
        Ok(())
    }
}

/// Transaction holding the SQLite write lock, opened for one adventure.
///
/// The lock is taken by a no-op update of the adventure row before anything
/// is read, so two holders for the same adventure never interleave.
pub struct SqliteAdventureLock {
    tx: Transaction<'static, Sqlite>,
    adventure: Adventure,
}

impl SqliteAdventureLock {
    async fn acquire(store: &SqliteStore, id: AdventureId) -> Result<Self, RepoError> {
        let mut tx = store
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("adventures.lock", e))?;

        let touched = sqlx::query("UPDATE adventures SET is_waiting_ai = is_waiting_ai WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("adventures.lock", e))?;
        if touched.rows_affected() == 0 {
            return Err(RepoError::not_found("Adventure", id));
        }

        let adventure = get(&mut tx, id)
            .await?
            .ok_or_else(|| RepoError::not_found("Adventure", id))?;

        Ok(Self { tx, adventure })
    }
}

#[async_trait]
impl AdventureLock for SqliteAdventureLock {
    fn adventure(&self) -> &Adventure {
        &self.adventure
    }

    async fn set_waiting_ai(&mut self, waiting: bool) -> Result<(), RepoError> {
        write_waiting_ai(&mut self.tx, self.adventure.id, waiting).await?;
        self.adventure.is_waiting_ai = waiting;
        Ok(())
    }

    async fn history_entry(
        &mut self,
        id: HistoryEntryId,
    ) -> Result<Option<HistoryEntry>, RepoError> {
        history::get(&mut self.tx, self.adventure.id, id).await
    }

    async fn last_history_entry(&mut self) -> Result<Option<HistoryEntry>, RepoError> {
        history::last(&mut self.tx, self.adventure.id).await
    }

    async fn delete_history_after(&mut self, id: HistoryEntryId) -> Result<u64, RepoError> {
        history::delete_after(&mut self.tx, self.adventure.id, id).await
    }

    async fn delete_history_entry(&mut self, id: HistoryEntryId) -> Result<(), RepoError> {
        history::delete(&mut self.tx, self.adventure.id, id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepoError::database("adventures.commit", e))
    }
}
