//! Player-scoped run reads and deletion.

use std::sync::Arc;

use taleweaver_domain::{Adventure, AdventureId, UserId};

use super::RunError;
use crate::infrastructure::ports::AdventureRepo;

pub struct RunManagement {
    adventures: Arc<dyn AdventureRepo>,
}

impl RunManagement {
    pub fn new(adventures: Arc<dyn AdventureRepo>) -> Self {
        Self { adventures }
    }

    /// The player's runs, newest first.
    pub async fn list_runs(&self, player: UserId) -> Result<Vec<Adventure>, RunError> {
        Ok(self.adventures.list_runs(player).await?)
    }

    /// Runs of other players and templates are reported as missing.
    pub async fn get_run(&self, run: AdventureId, player: UserId) -> Result<Adventure, RunError> {
        self.adventures
            .get(run)
            .await?
            .filter(|adventure| adventure.is_run() && adventure.is_owned_by_player(player))
            .ok_or_else(|| RunError::NotFound(format!("Run not found: {run}")))
    }

    pub async fn delete_run(&self, run: AdventureId, player: UserId) -> Result<(), RunError> {
        self.get_run(run, player).await?;
        if !self.adventures.delete(run).await? {
            return Err(RunError::NotFound(format!("Run not found: {run}")));
        }
        tracing::info!(adventure_id = %run, "Run deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockAdventureRepo;
    use chrono::Utc;

    fn run(id: i64, player: UserId) -> Adventure {
        Adventure {
            id: AdventureId::new(id),
            author: UserId::new(),
            player: Some(player),
            template_id: Some(AdventureId::new(1)),
            is_template: false,
            is_waiting_ai: false,
            rollback_min_history_id: None,
            primary_hero_id: None,
            title: "Run".to_string(),
            description: String::new(),
            intro: String::new(),
            spec_instructions: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn foreign_run_is_not_found() {
        let owner = UserId::new();
        let stranger = UserId::new();
        let mut adventures = MockAdventureRepo::new();
        adventures
            .expect_get()
            .returning(move |id| Ok(Some(run(id.get(), owner))));
        adventures.expect_delete().never();

        let manage = RunManagement::new(Arc::new(adventures));

        assert!(manage.get_run(AdventureId::new(5), owner).await.is_ok());
        let err = manage
            .delete_run(AdventureId::new(5), stranger)
            .await
            .expect_err("stranger must not delete");
        assert!(matches!(err, RunError::NotFound(_)));
    }

    #[tokio::test]
    async fn template_is_not_a_run() {
        let player = UserId::new();
        let mut adventures = MockAdventureRepo::new();
        adventures.expect_get().returning(move |id| {
            let mut template = run(id.get(), player);
            template.is_template = true;
            Ok(Some(template))
        });

        let manage = RunManagement::new(Arc::new(adventures));
        let err = manage.get_run(AdventureId::new(1), player).await.unwrap_err();
        assert!(matches!(err, RunError::NotFound(_)));
    }
}
