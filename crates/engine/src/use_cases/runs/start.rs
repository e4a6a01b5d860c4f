//! Starting a run from a template.

use std::sync::Arc;

use taleweaver_domain::{AdventureId, NewAdventure, NewHistoryEntry, UserId};

use super::snapshot::materialize;
use super::RunError;
use crate::infrastructure::ports::GraphRepo;

/// Deep-copies a template into a new run owned by a player.
pub struct StartRun {
    graphs: Arc<dyn GraphRepo>,
}

impl StartRun {
    pub fn new(graphs: Arc<dyn GraphRepo>) -> Self {
        Self { graphs }
    }

    /// Either the whole run is written or nothing is.
    ///
    /// The intro is seeded only when the template's primary hero was copied;
    /// otherwise it is written when the player creates their hero.
    pub async fn execute(
        &self,
        template: AdventureId,
        player: UserId,
    ) -> Result<AdventureId, RunError> {
        let mut writer = self.graphs.begin_write().await?;

        let source = writer
            .load(template)
            .await?
            .filter(|graph| graph.adventure.is_template)
            .ok_or_else(|| RunError::NotFound(format!("Template not found: {template}")))?;
        let new_run = NewAdventure::run_of(&source.adventure, player)?;

        let created = materialize(writer.as_mut(), &new_run, &source).await?;
        if let Some(hero) = &created.primary_hero {
            if !hero.in_party {
                writer.set_in_party(hero.id).await?;
            }
            if let Some(intro) = source.adventure.render_intro(&hero.title) {
                writer
                    .append_history(&NewHistoryEntry::system(created.adventure, intro))
                    .await?;
            }
        }
        writer.commit().await?;

        tracing::info!(
            template_id = %template,
            adventure_id = %created.adventure,
            player = %player,
            "Run started"
        );
        Ok(created.adventure)
    }
}
