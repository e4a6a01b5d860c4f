//! AI turn use cases: generate, hero action and regenerate.

use std::sync::Arc;

use taleweaver_domain::{Adventure, AdventureId, HistoryEntry, HistoryRole, NewHistoryEntry};

use super::compaction::HistoryCompactor;
use super::guard::AiTurnGuard;
use super::prompts::generation_prompt;
use super::NarrativeError;
use crate::infrastructure::ports::{GraphRepo, HistoryRepo, LlmPort, LlmRequest};

/// Produces the next AI entry of a run. Callers must hold the run's
/// [`AiTurnPermit`](super::AiTurnPermit).
pub struct Narrator {
    compactor: HistoryCompactor,
    graphs: Arc<dyn GraphRepo>,
    history: Arc<dyn HistoryRepo>,
    llm: Arc<dyn LlmPort>,
    generation_max_tokens: u32,
}

impl Narrator {
    pub fn new(
        compactor: HistoryCompactor,
        graphs: Arc<dyn GraphRepo>,
        history: Arc<dyn HistoryRepo>,
        llm: Arc<dyn LlmPort>,
        generation_max_tokens: u32,
    ) -> Self {
        Self {
            compactor,
            graphs,
            history,
            llm,
            generation_max_tokens,
        }
    }

    pub async fn narrate(&self, run: &Adventure) -> Result<HistoryEntry, NarrativeError> {
        let window = self.compactor.select_window(run).await?;

        // Read after compaction so the prompt shows the updated cards.
        let graph = self
            .graphs
            .load(run.id)
            .await?
            .ok_or_else(|| NarrativeError::run_not_found(run.id))?;

        let request = LlmRequest::prompt(generation_prompt(&graph, &window.entries))
            .with_max_tokens(Some(self.generation_max_tokens));
        let response = self.llm.generate(request).await?;

        let content = response.content.trim();
        if content.is_empty() {
            return Err(NarrativeError::EmptyModelResponse);
        }

        let entry = self
            .history
            .append(NewHistoryEntry::ai(run.id, content))
            .await?;
        tracing::info!(
            adventure_id = %run.id,
            entry_id = %entry.id,
            window = window.entries.len(),
            "AI entry appended"
        );
        Ok(entry)
    }
}

fn log_failure(run: AdventureId, operation: &'static str, error: &NarrativeError) {
    match error {
        NarrativeError::Upstream(e) => {
            tracing::warn!(adventure_id = %run, operation, error = %e, "Model call failed")
        }
        NarrativeError::Repo(e) => {
            tracing::error!(adventure_id = %run, operation, error = %e, "Store failure")
        }
        other => tracing::debug!(adventure_id = %run, operation, error = %other, "Turn rejected"),
    }
}

/// Appends one AI entry to a run.
pub struct GenerateTurn {
    guard: Arc<AiTurnGuard>,
    narrator: Arc<Narrator>,
}

impl GenerateTurn {
    pub fn new(guard: Arc<AiTurnGuard>, narrator: Arc<Narrator>) -> Self {
        Self { guard, narrator }
    }

    pub async fn execute(&self, run: AdventureId) -> Result<HistoryEntry, NarrativeError> {
        let permit = self.guard.begin(run).await?;
        let result = self.narrator.narrate(permit.adventure()).await;
        permit.release().await;

        if let Err(e) = &result {
            log_failure(run, "generate_turn", e);
        }
        result
    }
}

#[derive(Debug, Clone)]
pub struct HeroActionResult {
    pub user_entry: HistoryEntry,
    pub ai_entry: HistoryEntry,
}

/// Records the player's action, then lets the model answer it.
pub struct SubmitHeroAction {
    guard: Arc<AiTurnGuard>,
    narrator: Arc<Narrator>,
    graphs: Arc<dyn GraphRepo>,
    history: Arc<dyn HistoryRepo>,
}

impl SubmitHeroAction {
    pub fn new(
        guard: Arc<AiTurnGuard>,
        narrator: Arc<Narrator>,
        graphs: Arc<dyn GraphRepo>,
        history: Arc<dyn HistoryRepo>,
    ) -> Self {
        Self {
            guard,
            narrator,
            graphs,
            history,
        }
    }

    /// The user entry is kept even when the model call fails afterwards.
    pub async fn execute(
        &self,
        run: AdventureId,
        content: &str,
    ) -> Result<HeroActionResult, NarrativeError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(NarrativeError::validation("Content is required"));
        }

        let permit = self.guard.begin(run).await?;
        let result = self.record_and_narrate(permit.adventure(), content).await;
        permit.release().await;

        if let Err(e) = &result {
            log_failure(run, "submit_hero_action", e);
        }
        result
    }

    async fn record_and_narrate(
        &self,
        run: &Adventure,
        content: &str,
    ) -> Result<HeroActionResult, NarrativeError> {
        let hero_title = match run.primary_hero_id {
            Some(hero) => self
                .graphs
                .load(run.id)
                .await?
                .and_then(|graph| graph.character(hero).map(|c| c.title.clone())),
            None => None,
        };
        let text = match hero_title {
            Some(title) => format!("{title}: {content}"),
            None => content.to_string(),
        };

        let user_entry = self.history.append(NewHistoryEntry::user(run.id, text)).await?;
        let ai_entry = self.narrator.narrate(run).await?;

        Ok(HeroActionResult {
            user_entry,
            ai_entry,
        })
    }
}

/// Replaces the last AI entry with a fresh one.
pub struct RegenerateLast {
    guard: Arc<AiTurnGuard>,
    narrator: Arc<Narrator>,
}

impl RegenerateLast {
    pub fn new(guard: Arc<AiTurnGuard>, narrator: Arc<Narrator>) -> Self {
        Self { guard, narrator }
    }

    /// The eligibility checks, the deletion and the latch all happen in one
    /// lock transaction, so a rejected request changes nothing.
    pub async fn execute(&self, run: AdventureId) -> Result<HistoryEntry, NarrativeError> {
        let mut lock = self.guard.lock_idle(run).await?;

        let last = lock
            .last_history_entry()
            .await?
            .ok_or_else(|| NarrativeError::validation("History is empty"))?;
        if !lock.adventure().allows_rollback_to(last.id) {
            return Err(NarrativeError::validation(
                "Regeneration is not allowed for this entry",
            ));
        }
        if last.role != HistoryRole::Ai {
            return Err(NarrativeError::validation(
                "Last entry is not generated by AI",
            ));
        }
        lock.delete_history_entry(last.id).await?;

        let permit = self.guard.acquire(lock).await?;
        tracing::debug!(adventure_id = %run, entry_id = %last.id, "Regenerating AI entry");
        let result = self.narrator.narrate(permit.adventure()).await;
        permit.release().await;

        if let Err(e) = &result {
            log_failure(run, "regenerate_last", e);
        }
        result
    }
}
