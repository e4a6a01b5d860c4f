//! History reads and rollback.

use std::sync::Arc;

use taleweaver_domain::{AdventureId, HistoryEntry, HistoryEntryId};

use super::guard::AiTurnGuard;
use super::NarrativeError;
use crate::infrastructure::ports::HistoryRepo;

pub struct ListHistory {
    history: Arc<dyn HistoryRepo>,
}

impl ListHistory {
    pub fn new(history: Arc<dyn HistoryRepo>) -> Self {
        Self { history }
    }

    pub async fn execute(&self, run: AdventureId) -> Result<Vec<HistoryEntry>, NarrativeError> {
        Ok(self.history.list(run).await?)
    }
}

/// Deletes every entry after a given one.
pub struct RollbackTo {
    guard: Arc<AiTurnGuard>,
}

impl RollbackTo {
    pub fn new(guard: Arc<AiTurnGuard>) -> Self {
        Self { guard }
    }

    /// Returns the number of deleted entries. Entries older than the rollback
    /// floor were folded into cards and cannot be rolled back to.
    pub async fn execute(
        &self,
        run: AdventureId,
        entry_id: HistoryEntryId,
    ) -> Result<u64, NarrativeError> {
        let mut lock = self.guard.lock_idle(run).await?;

        if !lock.adventure().allows_rollback_to(entry_id) {
            return Err(NarrativeError::validation(
                "Rollback is not allowed for this entry",
            ));
        }
        if lock.history_entry(entry_id).await?.is_none() {
            return Err(NarrativeError::NotFound(format!(
                "History entry not found: {entry_id}"
            )));
        }

        let deleted = lock.delete_history_after(entry_id).await?;
        lock.commit().await?;

        tracing::info!(
            adventure_id = %run,
            entry_id = %entry_id,
            deleted,
            "History rolled back"
        );
        Ok(deleted)
    }
}
