//! Applies decoded card updates to the run's records.
//!
//! Never fails: an entry that points at a missing record, carries nothing
//! applicable or is rejected by the store is logged and skipped, and the
//! remaining entries are still applied.

use std::sync::Arc;

use taleweaver_domain::{AdventureId, CardUpdatePayload};

use crate::infrastructure::ports::{CardRepo, RepoError};

/// Counts of applied and skipped entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardUpdateReport {
    pub applied: usize,
    pub skipped: usize,
}

pub struct CardUpdateApplier {
    cards: Arc<dyn CardRepo>,
}

impl CardUpdateApplier {
    pub fn new(cards: Arc<dyn CardRepo>) -> Self {
        Self { cards }
    }

    pub async fn apply(
        &self,
        adventure: AdventureId,
        payload: &CardUpdatePayload,
    ) -> CardUpdateReport {
        let mut report = CardUpdateReport::default();

        for update in &payload.events {
            if update.patch.is_empty() {
                report.skipped += 1;
                continue;
            }
            let result = self
                .cards
                .update_event(adventure, update.id, &update.patch)
                .await;
            report.record(adventure, "event", update.id.get(), result);
        }

        for update in &payload.characters {
            if update.patch.is_empty() {
                report.skipped += 1;
                continue;
            }
            let result = self
                .cards
                .update_character(adventure, update.id, &update.patch)
                .await;
            report.record(adventure, "character", update.id.get(), result);
        }

        for update in &payload.character_systems {
            let current = match self.cards.get_character_system(adventure, update.id).await {
                Ok(Some(current)) => current,
                other => {
                    report.record(
                        adventure,
                        "character_system",
                        update.id.get(),
                        other.map(|_| false),
                    );
                    continue;
                }
            };
            let patch = update.patch_against(&current);
            if patch.is_empty() {
                tracing::debug!(
                    adventure_id = %adventure,
                    record_id = %update.id,
                    "Character system update would regress, skipped"
                );
                report.skipped += 1;
                continue;
            }
            let result = self
                .cards
                .update_character_system(adventure, update.id, &patch)
                .await;
            report.record(adventure, "character_system", update.id.get(), result);
        }

        for update in &payload.character_techniques {
            let Some(notes) = &update.notes else {
                report.skipped += 1;
                continue;
            };
            let result = self
                .cards
                .update_character_technique_notes(adventure, update.id, notes)
                .await;
            report.record(adventure, "character_technique", update.id.get(), result);
        }

        tracing::info!(
            adventure_id = %adventure,
            applied = report.applied,
            skipped = report.skipped,
            "Card updates applied"
        );
        report
    }
}

impl CardUpdateReport {
    fn record(
        &mut self,
        adventure: AdventureId,
        kind: &'static str,
        record_id: i64,
        result: Result<bool, RepoError>,
    ) {
        match result {
            Ok(true) => self.applied += 1,
            Ok(false) => {
                tracing::debug!(
                    adventure_id = %adventure,
                    kind,
                    record_id,
                    "Card update target not found in this run"
                );
                self.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(
                    adventure_id = %adventure,
                    kind,
                    record_id,
                    error = %e,
                    "Card update rejected"
                );
                self.skipped += 1;
            }
        }
    }
}
