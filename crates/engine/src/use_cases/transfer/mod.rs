//! Template listing, export and import.

mod document;

use std::sync::Arc;

use taleweaver_domain::{Adventure, AdventureId, NewAdventure, UserId};
use taleweaver_shared::{TemplateExport, TEMPLATE_EXPORT_VERSION};

use crate::infrastructure::ports::{AdventureRepo, ClockPort, GraphRepo};
use crate::use_cases::runs::snapshot::materialize;
use crate::use_cases::runs::RunError;

pub struct TemplateTransfer {
    adventures: Arc<dyn AdventureRepo>,
    graphs: Arc<dyn GraphRepo>,
    clock: Arc<dyn ClockPort>,
}

impl TemplateTransfer {
    pub fn new(
        adventures: Arc<dyn AdventureRepo>,
        graphs: Arc<dyn GraphRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            adventures,
            graphs,
            clock,
        }
    }

    pub async fn list_templates(&self) -> Result<Vec<Adventure>, RunError> {
        Ok(self.adventures.list_templates().await?)
    }

    pub async fn export_template(&self, template: AdventureId) -> Result<TemplateExport, RunError> {
        let graph = self
            .graphs
            .load(template)
            .await?
            .filter(|graph| graph.adventure.is_template)
            .ok_or_else(|| RunError::NotFound(format!("Template not found: {template}")))?;
        Ok(document::export_graph(&graph))
    }

    /// Creates a new template authored by `author`. References that do not
    /// resolve inside the document are dropped.
    pub async fn import_template(
        &self,
        document: &TemplateExport,
        author: UserId,
    ) -> Result<AdventureId, RunError> {
        if document.version != TEMPLATE_EXPORT_VERSION {
            return Err(RunError::validation(format!(
                "Unsupported template version: {}",
                document.version
            )));
        }

        let source = document::import_graph(document, author, self.clock.now());
        let adventure = &source.adventure;
        let target = NewAdventure::template(author, adventure.title.clone())?
            .with_description(adventure.description.clone())
            .with_intro(adventure.intro.clone())
            .with_spec_instructions(adventure.spec_instructions.clone());

        let mut writer = self.graphs.begin_write().await?;
        let created = materialize(writer.as_mut(), &target, &source).await?;
        writer.commit().await?;

        tracing::info!(
            adventure_id = %created.adventure,
            dropped = created.dropped,
            "Template imported"
        );
        Ok(created.adventure)
    }
}
