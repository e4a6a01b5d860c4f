//! Run lifecycle use cases: starting a run from a template, creating its
//! primary hero, and player-scoped run management.

mod hero;
mod manage;
pub(crate) mod snapshot;
mod start;

#[cfg(test)]
mod runs_tests;

pub use hero::CreatePrimaryHero;
pub use manage::RunManagement;
pub use start::StartRun;

use std::sync::Arc;

use taleweaver_domain::DomainError;

use crate::infrastructure::ports::RepoError;

/// Shared error type for run use cases.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Repo(RepoError),
}

impl RunError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<RepoError> for RunError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound { .. } => Self::NotFound(error.to_string()),
            RepoError::ConstraintViolation(message) => Self::Validation(message),
            other => Self::Repo(other),
        }
    }
}

impl From<DomainError> for RunError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::NotFound { .. } => Self::NotFound(error.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Container for run use cases.
pub struct RunUseCases {
    pub start_run: Arc<StartRun>,
    pub create_hero: Arc<CreatePrimaryHero>,
    pub manage: Arc<RunManagement>,
}

impl RunUseCases {
    pub fn new(
        start_run: Arc<StartRun>,
        create_hero: Arc<CreatePrimaryHero>,
        manage: Arc<RunManagement>,
    ) -> Self {
        Self {
            start_run,
            create_hero,
            manage,
        }
    }
}
