//! History entries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use taleweaver_domain::{AdventureId, HistoryEntry, HistoryEntryId, NewHistoryEntry};

use super::rows::{self, encode_metadata, encode_time, store_error, HISTORY_COLUMNS};
use super::SqliteStore;
use crate::infrastructure::ports::{HistoryRepo, RepoError};

pub(crate) async fn list(
    conn: &mut SqliteConnection,
    adventure: AdventureId,
) -> Result<Vec<HistoryEntry>, RepoError> {
    let sql = format!(
        "SELECT {HISTORY_COLUMNS} FROM adventure_history WHERE adventure_id = ? ORDER BY id ASC"
    );
    sqlx::query(&sql)
        .bind(adventure.get())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| store_error("history.list", e))?
        .iter()
        .map(rows::history_entry)
        .collect()
}

pub(crate) async fn get(
    conn: &mut SqliteConnection,
    adventure: AdventureId,
    id: HistoryEntryId,
) -> Result<Option<HistoryEntry>, RepoError> {
    let sql = format!(
        "SELECT {HISTORY_COLUMNS} FROM adventure_history WHERE adventure_id = ? AND id = ?"
    );
    sqlx::query(&sql)
        .bind(adventure.get())
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| store_error("history.get", e))?
        .as_ref()
        .map(rows::history_entry)
        .transpose()
}

pub(crate) async fn last(
    conn: &mut SqliteConnection,
    adventure: AdventureId,
) -> Result<Option<HistoryEntry>, RepoError> {
    let sql = format!(
        "SELECT {HISTORY_COLUMNS} FROM adventure_history WHERE adventure_id = ? \
         ORDER BY id DESC LIMIT 1"
    );
    sqlx::query(&sql)
        .bind(adventure.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| store_error("history.last", e))?
        .as_ref()
        .map(rows::history_entry)
        .transpose()
}

pub(crate) async fn append(
    conn: &mut SqliteConnection,
    entry: &NewHistoryEntry,
    now: DateTime<Utc>,
) -> Result<HistoryEntry, RepoError> {
    let result = sqlx::query(
        "INSERT INTO adventure_history (adventure_id, role, content, metadata, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(entry.adventure_id.get())
    .bind(entry.role.as_str())
    .bind(&entry.content)
    .bind(encode_metadata(&entry.metadata)?)
    .bind(encode_time(now))
    .execute(&mut *conn)
    .await
    .map_err(|e| store_error("history.append", e))?;

    Ok(HistoryEntry {
        id: HistoryEntryId::new(result.last_insert_rowid()),
        adventure_id: entry.adventure_id,
        role: entry.role,
        content: entry.content.clone(),
        metadata: entry.metadata.clone(),
        created_at: now,
    })
}

pub(crate) async fn delete_after(
    conn: &mut SqliteConnection,
    adventure: AdventureId,
    id: HistoryEntryId,
) -> Result<u64, RepoError> {
    let result = sqlx::query("DELETE FROM adventure_history WHERE adventure_id = ? AND id > ?")
        .bind(adventure.get())
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| store_error("history.delete_after", e))?;
    Ok(result.rows_affected())
}

pub(crate) async fn delete(
    conn: &mut SqliteConnection,
    adventure: AdventureId,
    id: HistoryEntryId,
) -> Result<(), RepoError> {
    sqlx::query("DELETE FROM adventure_history WHERE adventure_id = ? AND id = ?")
        .bind(adventure.get())
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| store_error("history.delete", e))?;
    Ok(())
}

#[async_trait]
impl HistoryRepo for SqliteStore {
    async fn list(&self, adventure: AdventureId) -> Result<Vec<HistoryEntry>, RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("history.list", e))?;
        list(&mut conn, adventure).await
    }

    async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, RepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| RepoError::database("history.append", e))?;
        append(&mut conn, &entry, self.clock.now()).await
    }
}
