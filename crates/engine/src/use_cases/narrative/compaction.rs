//! Keeps the prompt window bounded by folding old history into cards.

use std::sync::Arc;

use taleweaver_domain::{
    extract_json_object, plan_window, Adventure, AdventureGraph, CardUpdatePayload, HistoryEntry,
    HistoryEntryId, WindowPlan,
};

use super::card_updates::{CardUpdateApplier, CardUpdateReport};
use super::prompts::card_update_prompt;
use super::NarrativeError;
use crate::infrastructure::config::NarrativeSettings;
use crate::infrastructure::ports::{AdventureRepo, GraphRepo, HistoryRepo, LlmPort, LlmRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// The window fit without calling the model.
    NotNeeded,
    /// Cards were updated and the rollback floor moved to `floor`.
    Applied {
        floor: HistoryEntryId,
        report: CardUpdateReport,
    },
    /// The model answered with something that is not a JSON object, twice.
    /// No card was touched and the floor did not move.
    Malformed,
}

#[derive(Debug, Clone)]
pub struct SelectedWindow {
    /// At most `max_posts` entries, oldest first.
    pub entries: Vec<HistoryEntry>,
    pub compaction: CompactionOutcome,
}

pub struct HistoryCompactor {
    history: Arc<dyn HistoryRepo>,
    adventures: Arc<dyn AdventureRepo>,
    graphs: Arc<dyn GraphRepo>,
    llm: Arc<dyn LlmPort>,
    applier: CardUpdateApplier,
    settings: NarrativeSettings,
}

impl HistoryCompactor {
    pub fn new(
        history: Arc<dyn HistoryRepo>,
        adventures: Arc<dyn AdventureRepo>,
        graphs: Arc<dyn GraphRepo>,
        llm: Arc<dyn LlmPort>,
        applier: CardUpdateApplier,
        settings: NarrativeSettings,
    ) -> Self {
        Self {
            history,
            adventures,
            graphs,
            llm,
            applier,
            settings,
        }
    }

    /// Selects the history entries for the next prompt, compacting at most
    /// one window's worth of history on the way.
    ///
    /// `run` must have been read under the AI guard, so its rollback floor is
    /// current. Only a gateway failure is an error; unparseable output still
    /// yields a bounded window.
    pub async fn select_window(&self, run: &Adventure) -> Result<SelectedWindow, NarrativeError> {
        let history = self.history.list(run.id).await?;
        let plan = plan_window(&history, run.rollback_min_history_id, self.settings.limits);

        let compaction = match plan {
            WindowPlan::Verbatim { .. } => CompactionOutcome::NotNeeded,
            WindowPlan::Compact { cutoff, .. } => {
                self.compact(run, plan.tail(&history), cutoff).await?
            }
        };

        Ok(SelectedWindow {
            entries: plan.window(&history).to_vec(),
            compaction,
        })
    }

    async fn compact(
        &self,
        run: &Adventure,
        tail: &[HistoryEntry],
        cutoff: HistoryEntryId,
    ) -> Result<CompactionOutcome, NarrativeError> {
        let graph = self
            .graphs
            .load(run.id)
            .await?
            .ok_or_else(|| NarrativeError::run_not_found(run.id))?;

        let Some(payload) = self.extract_updates(&graph, tail).await? else {
            tracing::warn!(
                adventure_id = %run.id,
                cutoff = %cutoff,
                "Card update extraction failed, history trimmed without card sync"
            );
            return Ok(CompactionOutcome::Malformed);
        };

        let report = self.applier.apply(run.id, &payload).await;
        self.adventures
            .advance_rollback_floor(run.id, cutoff)
            .await?;
        tracing::info!(adventure_id = %run.id, floor = %cutoff, "History compacted");

        Ok(CompactionOutcome::Applied {
            floor: cutoff,
            report,
        })
    }

    /// Asks for card updates, retrying once with the strict prompt.
    async fn extract_updates(
        &self,
        graph: &AdventureGraph,
        tail: &[HistoryEntry],
    ) -> Result<Option<CardUpdatePayload>, NarrativeError> {
        let passes = [
            (false, self.settings.update_max_tokens),
            (true, self.settings.strict_update_max_tokens),
        ];

        for (strict, max_tokens) in passes {
            let request = LlmRequest::prompt(card_update_prompt(graph, tail, strict))
                .with_max_tokens(Some(max_tokens));
            let response = self.llm.generate(request).await?;

            if let Some(object) = extract_json_object(&response.content) {
                return Ok(Some(CardUpdatePayload::from_json(&object)));
            }
            tracing::warn!(
                adventure_id = %graph.adventure.id,
                strict,
                response = %response.content,
                "Invalid card update JSON"
            );
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        LlmError, LlmResponse, MockAdventureRepo, MockCardRepo, MockGraphRepo, MockHistoryRepo,
        MockLlmPort,
    };
    use chrono::Utc;
    use mockall::predicate::*;
    use mockall::Sequence;
    use serde_json::Map;
    use taleweaver_domain::{AdventureId, HistoryLimits, HistoryRole, UserId};

    const RUN: AdventureId = AdventureId::new(9);

    fn settings() -> NarrativeSettings {
        NarrativeSettings {
            limits: HistoryLimits::new(5, 2),
            update_max_tokens: 900,
            strict_update_max_tokens: 300,
            ..NarrativeSettings::default()
        }
    }

    fn run() -> Adventure {
        Adventure {
            id: RUN,
            author: UserId::new(),
            player: Some(UserId::new()),
            template_id: Some(AdventureId::new(1)),
            is_template: false,
            is_waiting_ai: true,
            rollback_min_history_id: None,
            primary_hero_id: None,
            title: "Salt Roads".to_string(),
            description: String::new(),
            intro: String::new(),
            spec_instructions: String::new(),
            created_at: Utc::now(),
        }
    }

    fn history(count: i64) -> Vec<HistoryEntry> {
        (1..=count)
            .map(|id| HistoryEntry {
                id: HistoryEntryId::new(id),
                adventure_id: RUN,
                role: if id % 2 == 0 {
                    HistoryRole::User
                } else {
                    HistoryRole::Ai
                },
                content: format!("entry {id}"),
                metadata: Map::new(),
                created_at: Utc::now(),
            })
            .collect()
    }

    fn compactor(
        llm: MockLlmPort,
        adventures: MockAdventureRepo,
        entries: Vec<HistoryEntry>,
    ) -> HistoryCompactor {
        let mut history = MockHistoryRepo::new();
        history
            .expect_list()
            .with(eq(RUN))
            .returning(move |_| Ok(entries.clone()));

        let mut graphs = MockGraphRepo::new();
        graphs
            .expect_load()
            .with(eq(RUN))
            .returning(|_| Ok(Some(AdventureGraph::empty(run()))));

        HistoryCompactor::new(
            Arc::new(history),
            Arc::new(adventures),
            Arc::new(graphs),
            Arc::new(llm),
            CardUpdateApplier::new(Arc::new(MockCardRepo::new())),
            settings(),
        )
    }

    #[tokio::test]
    async fn strict_retry_uses_its_own_token_cap() {
        let mut seq = Sequence::new();
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .withf(|request| {
                request.max_tokens == Some(900) && !request.prompt_text().contains("Return only JSON")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(LlmResponse::text("The cards look fine to me.")));
        llm.expect_generate()
            .withf(|request| {
                request.max_tokens == Some(300) && request.prompt_text().contains("Return only JSON")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(LlmResponse::text("{}")));

        let mut adventures = MockAdventureRepo::new();
        adventures
            .expect_advance_rollback_floor()
            .with(eq(RUN), eq(HistoryEntryId::new(3)))
            .times(1)
            .returning(|_, _| Ok(()));

        let selected = compactor(llm, adventures, history(7))
            .select_window(&run())
            .await
            .expect("window");

        assert_eq!(
            selected.compaction,
            CompactionOutcome::Applied {
                floor: HistoryEntryId::new(3),
                report: CardUpdateReport::default(),
            }
        );
        assert_eq!(selected.entries.len(), 5);
        assert_eq!(selected.entries[0].id, HistoryEntryId::new(3));
    }

    #[tokio::test]
    async fn two_bad_answers_leave_the_floor_alone() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .times(2)
            .returning(|_| Ok(LlmResponse::text("no json here")));

        let mut adventures = MockAdventureRepo::new();
        adventures.expect_advance_rollback_floor().never();

        let selected = compactor(llm, adventures, history(8))
            .select_window(&run())
            .await
            .expect("window");

        assert_eq!(selected.compaction, CompactionOutcome::Malformed);
        assert_eq!(selected.entries.len(), 5);
        assert_eq!(selected.entries[0].id, HistoryEntryId::new(4));
    }

    #[tokio::test]
    async fn short_history_never_calls_the_model() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate().never();
        let mut adventures = MockAdventureRepo::new();
        adventures.expect_advance_rollback_floor().never();

        let selected = compactor(llm, adventures, history(5))
            .select_window(&run())
            .await
            .expect("window");

        assert_eq!(selected.compaction, CompactionOutcome::NotNeeded);
        assert_eq!(selected.entries.len(), 5);
    }

    #[tokio::test]
    async fn gateway_failure_stops_before_the_strict_retry() {
        let mut llm = MockLlmPort::new();
        llm.expect_generate()
            .times(1)
            .returning(|_| Err(LlmError::RequestFailed("connection reset".to_string())));
        let mut adventures = MockAdventureRepo::new();
        adventures.expect_advance_rollback_floor().never();

        let err = compactor(llm, adventures, history(7))
            .select_window(&run())
            .await
            .expect_err("gateway failure");

        assert!(matches!(err, NarrativeError::Upstream(_)));
    }
}
