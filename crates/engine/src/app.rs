//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    config::NarrativeSettings,
    ports::{AdventureRepo, CardRepo, ClockPort, GraphRepo, HistoryRepo, LlmPort},
    sqlite::SqliteStore,
};
use crate::use_cases::{
    narrative::{
        AiTurnGuard, CardUpdateApplier, GenerateTurn, HistoryCompactor, ListHistory, Narrator,
        NarrativeUseCases, RegenerateLast, RollbackTo, SubmitHeroAction,
    },
    runs::{CreatePrimaryHero, RunManagement, RunUseCases, StartRun},
    transfer::TemplateTransfer,
};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Port traits the use cases were built from.
pub struct Repositories {
    pub adventures: Arc<dyn AdventureRepo>,
    pub history: Arc<dyn HistoryRepo>,
    pub cards: Arc<dyn CardRepo>,
    pub graphs: Arc<dyn GraphRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub narrative: NarrativeUseCases,
    pub runs: RunUseCases,
    pub transfer: Arc<TemplateTransfer>,
}

impl App {
    pub fn new(
        store: SqliteStore,
        llm: Arc<dyn LlmPort>,
        clock: Arc<dyn ClockPort>,
        settings: NarrativeSettings,
    ) -> Self {
        // One store implements every repository port
        let store = Arc::new(store);
        let adventures: Arc<dyn AdventureRepo> = store.clone();
        let history: Arc<dyn HistoryRepo> = store.clone();
        let cards: Arc<dyn CardRepo> = store.clone();
        let graphs: Arc<dyn GraphRepo> = store;

        let guard = Arc::new(AiTurnGuard::new(adventures.clone()));
        let compactor = HistoryCompactor::new(
            history.clone(),
            adventures.clone(),
            graphs.clone(),
            llm.clone(),
            CardUpdateApplier::new(cards.clone()),
            settings,
        );
        let narrator = Arc::new(Narrator::new(
            compactor,
            graphs.clone(),
            history.clone(),
            llm,
            settings.generation_max_tokens,
        ));

        let narrative = NarrativeUseCases::new(
            Arc::new(GenerateTurn::new(guard.clone(), narrator.clone())),
            Arc::new(SubmitHeroAction::new(
                guard.clone(),
                narrator.clone(),
                graphs.clone(),
                history.clone(),
            )),
            Arc::new(RollbackTo::new(guard.clone())),
            Arc::new(RegenerateLast::new(guard, narrator)),
            Arc::new(ListHistory::new(history.clone())),
        );

        let runs = RunUseCases::new(
            Arc::new(StartRun::new(graphs.clone())),
            Arc::new(CreatePrimaryHero::new(graphs.clone(), clock.clone())),
            Arc::new(RunManagement::new(adventures.clone())),
        );

        let transfer = Arc::new(TemplateTransfer::new(
            adventures.clone(),
            graphs.clone(),
            clock,
        ));

        Self {
            repositories: Repositories {
                adventures,
                history,
                cards,
                graphs,
            },
            use_cases: UseCases {
                narrative,
                runs,
                transfer,
            },
        }
    }
}
