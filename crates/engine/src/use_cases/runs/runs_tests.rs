//! Run start, hero creation and template transfer against SQLite.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use taleweaver_domain::{AdventureId, CharacterPatch, HistoryRole, UserId};
use taleweaver_shared::{
    CreateHeroRequest, HeroData, HeroSystemChoice, HeroTechniqueChoice, TemplateExport,
};

use super::RunError;
use crate::app::App;
use crate::infrastructure::config::NarrativeSettings;
use crate::infrastructure::ports::{AdventureRepo, CardRepo, MockClockPort};
use crate::test_fixtures::llm_doubles::ScriptedLlm;
use crate::test_fixtures::{load_fixture, TestStore, NO_HERO, SALT_ROADS};

fn app(db: &TestStore) -> App {
    db.app(ScriptedLlm::new(), NarrativeSettings::default())
}

// =============================================================================
// start_run
// =============================================================================

#[tokio::test]
async fn run_is_an_independent_copy_of_the_template() {
    let db = TestStore::new().await;
    let app = app(&db);
    let template = db.import(SALT_ROADS).await;
    let player = UserId::new();

    let run = app
        .use_cases
        .runs
        .start_run
        .execute(template, player)
        .await
        .unwrap();

    let source = db.graph(template).await;
    let copy = db.graph(run).await;

    assert!(copy.adventure.is_run());
    assert_eq!(copy.adventure.player, Some(player));
    assert_eq!(copy.adventure.template_id, Some(template));
    assert_eq!(copy.adventure.title, source.adventure.title);
    assert_eq!(copy.adventure.spec_instructions, source.adventure.spec_instructions);
    assert_eq!(copy.locations.len(), source.locations.len());
    assert_eq!(copy.characters.len(), source.characters.len());
    assert_eq!(copy.character_systems.len(), 1);
    assert_eq!(copy.character_techniques.len(), 1);
    assert_eq!(copy.character_factions.len(), 1);
    assert_eq!(copy.relationships.len(), 1);

    // No copied record shares an id with the template
    let source_ids: HashSet<_> = source.characters.iter().map(|c| c.id).collect();
    assert!(copy.characters.iter().all(|c| !source_ids.contains(&c.id)));
    assert!(copy.characters.iter().all(|c| c.adventure_id == run));

    // References point inside the run
    let hero = copy.primary_hero().unwrap();
    assert_eq!(hero.title, "Mara");
    assert!(hero.in_party);
    assert_eq!(copy.location(hero.location_id.unwrap()).unwrap().title, "Harbor");
    assert_eq!(copy.race(hero.race_id.unwrap()).unwrap().title, "Human");
    let link = &copy.character_systems[0];
    assert_eq!(link.character_id, hero.id);
    assert_eq!(copy.system(link.system_id).unwrap().title, "Tides");
    let harbor = copy.locations.iter().find(|l| l.title == "Harbor").unwrap();
    assert_eq!(copy.hero_setup.default_location_id, Some(harbor.id));

    // The template's own hero stays out of the party
    assert!(!source.primary_hero().unwrap().in_party);
}

#[tokio::test]
async fn run_starts_with_rendered_intro() {
    let db = TestStore::new().await;
    let app = app(&db);
    let template = db.import(SALT_ROADS).await;

    let run = app
        .use_cases
        .runs
        .start_run
        .execute(template, UserId::new())
        .await
        .unwrap();

    let history = db.history(run).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, HistoryRole::System);
    assert_eq!(history[0].content, "Mara wakes on the pier as the bell tolls.");
    assert!(db.history(template).await.is_empty());
}

#[tokio::test]
async fn editing_a_run_leaves_the_template_alone() {
    let db = TestStore::new().await;
    let app = app(&db);
    let template = db.import(SALT_ROADS).await;
    let run = app
        .use_cases
        .runs
        .start_run
        .execute(template, UserId::new())
        .await
        .unwrap();

    let hero = db.graph(run).await.primary_hero().unwrap().id;
    let patch = CharacterPatch {
        description: Some("Changed".into()),
        ..CharacterPatch::default()
    };
    db.store.update_character(run, hero, &patch).await.unwrap();

    let original = db.graph(template).await;
    assert_eq!(original.primary_hero().unwrap().description, "");
}

#[tokio::test]
async fn runs_cannot_be_started_from_runs() {
    let db = TestStore::new().await;
    let app = app(&db);
    let template = db.import(SALT_ROADS).await;
    let start = &app.use_cases.runs.start_run;
    let run = start.execute(template, UserId::new()).await.unwrap();

    assert!(matches!(
        start.execute(run, UserId::new()).await,
        Err(RunError::NotFound(_))
    ));
    assert!(matches!(
        start.execute(AdventureId::new(404), UserId::new()).await,
        Err(RunError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_the_template_keeps_its_runs() {
    let db = TestStore::new().await;
    let app = app(&db);
    let template = db.import(SALT_ROADS).await;
    let player = UserId::new();
    let run = app
        .use_cases
        .runs
        .start_run
        .execute(template, player)
        .await
        .unwrap();

    assert!(db.store.delete(template).await.unwrap());

    let runs = app.use_cases.runs.manage.list_runs(player).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, run);
    assert_eq!(runs[0].template_id, None);
}

// =============================================================================
// create_primary_hero
// =============================================================================

async fn heroless_run(db: &TestStore, app: &App) -> AdventureId {
    let template = db.import(NO_HERO).await;
    app.use_cases
        .runs
        .start_run
        .execute(template, UserId::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn hero_is_created_with_links_and_intro() {
    let db = TestStore::new().await;
    let app = app(&db);
    let run = heroless_run(&db, &app).await;
    let graph = db.graph(run).await;

    let request = CreateHeroRequest {
        hero: HeroData {
            title: Some("Ilya".into()),
            race: Some(graph.races[0].id.get()),
            body_power: Some(4),
            ..HeroData::default()
        },
        location_title: Some("  Driftwood Camp ".into()),
        systems: vec![HeroSystemChoice {
            system: graph.systems[0].id.get(),
            level: 1,
            progress_percent: 10,
            notes: String::new(),
        }],
        techniques: vec![HeroTechniqueChoice {
            technique: graph.techniques[0].id.get(),
            notes: "first lesson".into(),
        }],
        ..CreateHeroRequest::default()
    };

    let hero_id = app
        .use_cases
        .runs
        .create_hero
        .execute(run, &request)
        .await
        .unwrap();

    let graph = db.graph(run).await;
    let hero = graph.character(hero_id).unwrap();
    assert_eq!(graph.adventure.primary_hero_id, Some(hero_id));
    assert!(hero.is_player && hero.in_party);
    assert_eq!(hero.body_power, 4);
    // Falls back to the setup default, then to zero
    assert_eq!(hero.mind_power, 2);
    assert_eq!(hero.will_power, 0);
    let camp = graph.location(hero.location_id.unwrap()).unwrap();
    assert_eq!(camp.title, "Driftwood Camp");
    assert_eq!(graph.systems_of(hero_id).count(), 1);
    assert_eq!(graph.techniques_of(hero_id).count(), 1);

    let history = db.history(run).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "Ilya arrives at an empty shore.");

    let err = app
        .use_cases
        .runs
        .create_hero
        .execute(run, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Validation(ref m) if m == "Primary hero already exists"));
}

#[tokio::test]
async fn learned_techniques_are_stamped_by_the_clock() {
    let db = TestStore::new().await;
    let run = heroless_run(&db, &app(&db)).await;
    let graph = db.graph(run).await;

    let at = Utc.timestamp_opt(1_800_000_000, 0).unwrap();
    let mut clock = MockClockPort::new();
    clock.expect_now().times(1).return_const(at);
    let app = App::new(
        db.store.clone(),
        ScriptedLlm::new(),
        Arc::new(clock),
        NarrativeSettings::default(),
    );

    let request = CreateHeroRequest {
        hero: HeroData {
            title: Some("Ilya".into()),
            race: Some(graph.races[0].id.get()),
            body_power: Some(3),
            ..HeroData::default()
        },
        location_title: Some("Driftwood Camp".into()),
        techniques: vec![HeroTechniqueChoice {
            technique: graph.techniques[0].id.get(),
            notes: String::new(),
        }],
        ..CreateHeroRequest::default()
    };
    let hero_id = app
        .use_cases
        .runs
        .create_hero
        .execute(run, &request)
        .await
        .unwrap();

    let graph = db.graph(run).await;
    let learned: Vec<_> = graph.techniques_of(hero_id).map(|ct| ct.learned_at).collect();
    assert_eq!(learned, vec![at]);
}

#[tokio::test]
async fn hero_setup_rules_are_enforced() {
    let db = TestStore::new().await;
    let app = app(&db);
    let run = heroless_run(&db, &app).await;
    let graph = db.graph(run).await;
    let create = &app.use_cases.runs.create_hero;

    let base = CreateHeroRequest {
        hero: HeroData {
            race: Some(graph.races[0].id.get()),
            body_power: Some(1),
            ..HeroData::default()
        },
        location_id: Some(graph.locations[0].id.get()),
        ..CreateHeroRequest::default()
    };

    let mut missing_race = base.clone();
    missing_race.hero.race = None;
    assert!(matches!(
        create.execute(run, &missing_race).await,
        Err(RunError::Validation(ref m)) if m == "Race is required"
    ));

    let mut no_location = base.clone();
    no_location.location_id = None;
    assert!(matches!(
        create.execute(run, &no_location).await,
        Err(RunError::Validation(ref m)) if m == "Location is required"
    ));

    // Records of another adventure are invisible
    let other = db.import(SALT_ROADS).await;
    let foreign = db.graph(other).await.locations[0].id.get();
    let mut foreign_location = base.clone();
    foreign_location.location_id = Some(foreign);
    assert!(matches!(
        create.execute(run, &foreign_location).await,
        Err(RunError::Validation(ref m)) if m == "Location not found"
    ));

    let mut negative = base.clone();
    negative.hero.body_power = Some(-2);
    assert!(matches!(
        create.execute(run, &negative).await,
        Err(RunError::Validation(_))
    ));

    // Nothing was written by the rejected attempts
    let graph = db.graph(run).await;
    assert!(graph.characters.is_empty());
    assert_eq!(graph.locations.len(), 1);
    assert!(db.history(run).await.is_empty());

    let hero = create.execute(run, &base).await.unwrap();
    assert_eq!(db.graph(run).await.character(hero).unwrap().title, "Hero");
}

// =============================================================================
// Template transfer
// =============================================================================

#[tokio::test]
async fn export_then_import_reproduces_the_template() {
    let db = TestStore::new().await;
    let app = app(&db);
    let template = db.import(SALT_ROADS).await;
    let transfer = &app.use_cases.transfer;

    let exported = transfer.export_template(template).await.unwrap();
    let copy = transfer
        .import_template(&exported, UserId::new())
        .await
        .unwrap();

    assert_ne!(copy, template);
    assert_eq!(transfer.export_template(copy).await.unwrap(), exported);
    assert_eq!(transfer.list_templates().await.unwrap().len(), 2);
}

#[tokio::test]
async fn export_numbers_cards_in_title_order() {
    let db = TestStore::new().await;
    let app = app(&db);
    let template = db.import(SALT_ROADS).await;

    let exported = app
        .use_cases
        .transfer
        .export_template(template)
        .await
        .unwrap();

    assert_eq!(exported.version, 2);
    let titles: Vec<_> = exported
        .locations
        .iter()
        .map(|l| (l.export_id.as_str(), l.title.as_str()))
        .collect();
    assert_eq!(titles, vec![("1", "Harbor"), ("2", "Lighthouse")]);
    assert_eq!(exported.adventure.primary_hero.as_deref(), Some("1"));
    assert_eq!(exported.relationships[0].to_character.as_deref(), Some("2"));
}

#[tokio::test]
async fn import_rejects_other_versions_and_runs_cannot_be_exported() {
    let db = TestStore::new().await;
    let app = app(&db);
    let transfer = &app.use_cases.transfer;

    let mut document: TemplateExport = load_fixture(SALT_ROADS);
    document.version = 1;
    assert!(matches!(
        transfer.import_template(&document, UserId::new()).await,
        Err(RunError::Validation(_))
    ));
    assert!(transfer.list_templates().await.unwrap().is_empty());

    let template = db.import(SALT_ROADS).await;
    let run = app
        .use_cases
        .runs
        .start_run
        .execute(template, UserId::new())
        .await
        .unwrap();
    assert!(matches!(
        transfer.export_template(run).await,
        Err(RunError::NotFound(_))
    ));
}

#[tokio::test]
async fn import_drops_unresolved_links() {
    let db = TestStore::new().await;
    let app = app(&db);

    let mut document: TemplateExport = load_fixture(SALT_ROADS);
    document.techniques[0].system = Some("missing".into());
    document.relationships[0].to_character = None;

    let template = app
        .use_cases
        .transfer
        .import_template(&document, UserId::new())
        .await
        .unwrap();

    let graph = db.graph(template).await;
    assert!(graph.techniques.is_empty());
    assert!(graph.character_techniques.is_empty());
    assert!(graph.relationships.is_empty());
    assert_eq!(graph.character_systems.len(), 1);
}
