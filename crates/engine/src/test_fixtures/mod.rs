//! Test fixtures: JSON template files, a throwaway SQLite store and
//! hand-written LLM doubles.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::{TestStore, SALT_ROADS};
//!
//! #[tokio::test]
//! async fn starts_a_run() {
//!     let db = TestStore::new().await;
//!     let template = db.import(SALT_ROADS).await;
//!     // ... test logic
//! }
//! ```

pub mod llm_doubles;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use taleweaver_domain::{AdventureGraph, AdventureId, HistoryEntry, NewHistoryEntry, UserId};
use taleweaver_shared::TemplateExport;
use tempfile::TempDir;

use crate::app::App;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::config::NarrativeSettings;
use crate::infrastructure::ports::{ClockPort, GraphRepo, HistoryRepo, LlmPort};
use crate::infrastructure::sqlite::SqliteStore;
use crate::use_cases::TemplateTransfer;

/// Template with a primary hero, an intro and one of every card type.
pub const SALT_ROADS: &str = "templates/salt_roads.json";
/// Template without a primary hero, with strict hero setup rules.
pub const NO_HERO: &str = "templates/no_hero.json";

// =============================================================================
// Fixture Loading
// =============================================================================

/// Load a JSON fixture from the test_data/ directory.
///
/// # Panics
///
/// Panics if the fixture file cannot be read or parsed.
pub fn load_fixture<T: serde::de::DeserializeOwned>(path: &str) -> T {
    let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(path);
    let content = std::fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture '{}': {}",
            fixture_path.display(),
            e
        )
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        panic!(
            "Failed to parse fixture '{}': {}",
            fixture_path.display(),
            e
        )
    })
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

pub fn fixed_clock() -> Arc<dyn ClockPort> {
    Arc::new(FixedClock(fixed_now()))
}

// =============================================================================
// Store
// =============================================================================

/// SQLite store in a temporary directory, removed on drop.
pub struct TestStore {
    pub store: SqliteStore,
    _dir: TempDir,
}

impl TestStore {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taleweaver.db");
        let store = SqliteStore::connect(path.to_str().unwrap(), fixed_clock())
            .await
            .unwrap();
        Self { store, _dir: dir }
    }

    /// Application wired to this store.
    pub fn app(&self, llm: Arc<dyn LlmPort>, settings: NarrativeSettings) -> App {
        App::new(self.store.clone(), llm, fixed_clock(), settings)
    }

    /// Imports a fixture template and returns its id.
    pub async fn import(&self, fixture: &str) -> AdventureId {
        let store = Arc::new(self.store.clone());
        let transfer = TemplateTransfer::new(store.clone(), store, fixed_clock());
        let document: TemplateExport = load_fixture(fixture);
        transfer
            .import_template(&document, UserId::new())
            .await
            .unwrap()
    }

    pub async fn graph(&self, adventure: AdventureId) -> AdventureGraph {
        self.store.load(adventure).await.unwrap().unwrap()
    }

    pub async fn history(&self, adventure: AdventureId) -> Vec<HistoryEntry> {
        self.store.list(adventure).await.unwrap()
    }

    /// Appends `count` alternating user/AI entries.
    pub async fn append_posts(&self, adventure: AdventureId, count: usize) -> Vec<HistoryEntry> {
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let entry = if i % 2 == 0 {
                NewHistoryEntry::user(adventure, format!("Mara: step {i}"))
            } else {
                NewHistoryEntry::ai(adventure, format!("The sea answers {i}."))
            };
            entries.push(self.store.append(entry).await.unwrap());
        }
        entries
    }
}
