//! Narrative use cases - the AI turn loop over a run's history.
//!
//! Every operation that calls the model goes through [`AiTurnGuard`], which
//! allows at most one model round-trip per run at a time.

mod card_updates;
mod compaction;
mod guard;
mod history;
pub mod prompts;
mod turns;


pub use card_updates::{CardUpdateApplier, CardUpdateReport};
pub use compaction::{CompactionOutcome, HistoryCompactor, SelectedWindow};
pub use guard::{AiTurnGuard, AiTurnPermit};
pub use history::{ListHistory, RollbackTo};
pub use turns::{GenerateTurn, HeroActionResult, Narrator, RegenerateLast, SubmitHeroAction};

use std::sync::Arc;

use taleweaver_domain::AdventureId;

use crate::infrastructure::ports::{LlmError, RepoError};

/// Failures of the narrative operations.
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    /// A model round-trip is already in flight for this run.
    #[error("Model response is already in progress")]
    Conflict,
    #[error("{0}")]
    Validation(String),
    #[error("Empty model response")]
    EmptyModelResponse,
    #[error("Model response failed: {0}")]
    Upstream(#[from] LlmError),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Repo(RepoError),
}

impl NarrativeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn run_not_found(run: AdventureId) -> Self {
        Self::NotFound(format!("Run not found: {run}"))
    }
}

impl From<RepoError> for NarrativeError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound { .. } => Self::NotFound(error.to_string()),
            other => Self::Repo(other),
        }
    }
}

/// Container for narrative use cases.
pub struct NarrativeUseCases {
    pub generate_turn: Arc<GenerateTurn>,
    pub submit_hero_action: Arc<SubmitHeroAction>,
    pub rollback_to: Arc<RollbackTo>,
    pub regenerate_last: Arc<RegenerateLast>,
    pub list_history: Arc<ListHistory>,
}

impl NarrativeUseCases {
    pub fn new(
        generate_turn: Arc<GenerateTurn>,
        submit_hero_action: Arc<SubmitHeroAction>,
        rollback_to: Arc<RollbackTo>,
        regenerate_last: Arc<RegenerateLast>,
        list_history: Arc<ListHistory>,
    ) -> Self {
        Self {
            generate_turn,
            submit_hero_action,
            rollback_to,
            regenerate_last,
            list_history,
        }
    }
}
