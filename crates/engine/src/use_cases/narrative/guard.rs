//! Single-flight guard around model round-trips.
//!
//! The `is_waiting_ai` latch is read and set under the adventure's row lock,
//! and the lock transaction commits before the model is called. The latch is
//! cleared by [`AiTurnPermit::release`], or by the permit's `Drop` when the
//! request future is cancelled before it gets there.

use std::sync::Arc;

use taleweaver_domain::{Adventure, AdventureId};

use super::NarrativeError;
use crate::infrastructure::ports::{AdventureLock, AdventureRepo};

pub struct AiTurnGuard {
    adventures: Arc<dyn AdventureRepo>,
}

impl AiTurnGuard {
    pub fn new(adventures: Arc<dyn AdventureRepo>) -> Self {
        Self { adventures }
    }

    /// Opens the run's lock transaction, failing with `Conflict` if a model
    /// call is in flight. Dropping the returned lock rolls back.
    pub async fn lock_idle(
        &self,
        run: AdventureId,
    ) -> Result<Box<dyn AdventureLock>, NarrativeError> {
        let lock = self.adventures.lock(run).await?;
        if lock.adventure().is_waiting_ai {
            tracing::debug!(adventure_id = %run, "AI turn already in flight");
            return Err(NarrativeError::Conflict);
        }
        Ok(lock)
    }

    /// Sets the latch inside `lock` and commits it.
    pub async fn acquire(
        &self,
        mut lock: Box<dyn AdventureLock>,
    ) -> Result<AiTurnPermit, NarrativeError> {
        lock.set_waiting_ai(true).await?;
        let adventure = lock.adventure().clone();
        lock.commit().await?;

        tracing::debug!(adventure_id = %adventure.id, "AI turn started");
        Ok(AiTurnPermit {
            adventures: self.adventures.clone(),
            adventure,
            released: false,
        })
    }

    pub async fn begin(&self, run: AdventureId) -> Result<AiTurnPermit, NarrativeError> {
        let lock = self.lock_idle(run).await?;
        self.acquire(lock).await
    }
}

/// Proof that this request owns the run's AI latch.
#[must_use = "the AI latch stays set until the permit is released"]
pub struct AiTurnPermit {
    adventures: Arc<dyn AdventureRepo>,
    adventure: Adventure,
    released: bool,
}

impl AiTurnPermit {
    /// The run as read under the lock when the latch was set.
    pub fn adventure(&self) -> &Adventure {
        &self.adventure
    }

    /// Clears the latch in its own transaction.
    pub async fn release(mut self) {
        self.released = true;
        clear_latch(self.adventures.clone(), self.adventure.id).await;
    }
}

async fn clear_latch(adventures: Arc<dyn AdventureRepo>, run: AdventureId) {
    match adventures.set_waiting_ai(run, false).await {
        Ok(()) => tracing::debug!(adventure_id = %run, "AI turn finished"),
        Err(e) => tracing::error!(
            adventure_id = %run,
            error = %e,
            "Failed to clear AI latch; it will be reset on next startup"
        ),
    }
}

impl Drop for AiTurnPermit {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let adventures = self.adventures.clone();
        let run = self.adventure.id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(adventure_id = %run, "AI turn abandoned, clearing latch");
                handle.spawn(clear_latch(adventures, run));
            }
            Err(_) => tracing::error!(
                adventure_id = %run,
                "AI turn abandoned outside a runtime; latch left set"
            ),
        }
    }
}
