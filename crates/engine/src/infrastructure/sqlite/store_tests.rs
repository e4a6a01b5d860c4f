//! SQLite store behaviour on a temporary database.

use taleweaver_domain::{
    AdventureId, Character, CharacterPatch, EventPatch, EventStatus, HistoryEntryId,
    NewHistoryEntry, UserId,
};

use crate::infrastructure::ports::{AdventureRepo, CardRepo, GraphRepo, HistoryRepo, RepoError};
use crate::test_fixtures::{TestStore, NO_HERO, SALT_ROADS};

#[tokio::test]
async fn import_writes_every_card_type() {
    let db = TestStore::new().await;
    let template = db.import(SALT_ROADS).await;

    let graph = db.graph(template).await;
    assert!(graph.adventure.is_template);
    assert_eq!(graph.locations.len(), 2);
    assert_eq!(graph.races.len(), 1);
    assert_eq!(graph.systems.len(), 1);
    assert_eq!(graph.techniques.len(), 1);
    assert_eq!(graph.factions.len(), 1);
    assert_eq!(graph.other_info.len(), 1);
    assert_eq!(graph.events.len(), 2);
    assert_eq!(graph.characters.len(), 2);
    assert_eq!(graph.character_systems.len(), 1);
    assert_eq!(graph.character_techniques.len(), 1);
    assert_eq!(graph.character_factions.len(), 1);
    assert_eq!(graph.relationships.len(), 1);

    assert_eq!(graph.primary_hero().unwrap().title, "Mara");
    let harbor = graph.locations.iter().find(|l| l.title == "Harbor").unwrap();
    assert_eq!(graph.hero_setup.default_location_id, Some(harbor.id));
    // Cards come back in title order
    assert_eq!(graph.characters[0].title, "Mara");
    assert_eq!(graph.characters[1].title, "Old Jory");
}

#[tokio::test]
async fn cross_adventure_reference_is_rejected() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;
    let shore = db.import(NO_HERO).await;
    let foreign_location = db.graph(shore).await.locations[0].id;

    let mut writer = db.store.begin_write().await.unwrap();
    let stray = Character {
        location_id: Some(foreign_location),
        ..Character::blank(salt, "Stray")
    };
    let err = writer.create_character(salt, &stray).await.unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)), "{err:?}");
    drop(writer);

    assert_eq!(db.graph(salt).await.characters.len(), 2);
}

#[tokio::test]
async fn dropped_writer_discards_everything() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;

    let mut writer = db.store.begin_write().await.unwrap();
    writer
        .create_character(salt, &Character::blank(salt, "Ghost"))
        .await
        .unwrap();
    drop(writer);

    assert!(db
        .graph(salt)
        .await
        .characters
        .iter()
        .all(|c| c.title != "Ghost"));
}

#[tokio::test]
async fn delete_cascades_to_cards_and_history() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;
    db.append_posts(salt, 3).await;

    assert!(db.store.delete(salt).await.unwrap());
    assert!(db.store.load(salt).await.unwrap().is_none());
    assert!(db.store.list(salt).await.unwrap().is_empty());
    assert!(!db.store.delete(salt).await.unwrap());
}

#[tokio::test]
async fn partial_updates_touch_only_given_fields() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;
    let graph = db.graph(salt).await;
    let mara = graph.primary_hero().unwrap().clone();

    let patch = CharacterPatch {
        description: Some("Soaked to the bone.".into()),
        ..CharacterPatch::default()
    };
    assert!(db.store.update_character(salt, mara.id, &patch).await.unwrap());

    let updated = db.graph(salt).await.character(mara.id).unwrap().clone();
    assert_eq!(updated.description, "Soaked to the bone.");
    assert_eq!(updated.mind_power, mara.mind_power);
    assert_eq!(updated.age, mara.age);

    let storm = graph.events.iter().find(|e| e.title == "Storm Warning").unwrap();
    let patch = EventPatch {
        status: Some(EventStatus::Resolved),
        state: None,
    };
    assert!(db.store.update_event(salt, storm.id, &patch).await.unwrap());
    let storm_after = db
        .graph(salt)
        .await
        .events
        .into_iter()
        .find(|e| e.id == storm.id)
        .unwrap();
    assert_eq!(storm_after.status, EventStatus::Resolved);
    assert_eq!(storm_after.state, "clouds gather");
}

#[tokio::test]
async fn updates_are_scoped_to_the_adventure() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;
    let shore = db.import(NO_HERO).await;
    let mara = db.graph(salt).await.primary_hero().unwrap().id;

    let patch = CharacterPatch {
        body_power: Some(9),
        ..CharacterPatch::default()
    };
    assert!(!db.store.update_character(shore, mara, &patch).await.unwrap());
    // Empty patches still report whether the record exists
    assert!(db
        .store
        .update_character(salt, mara, &CharacterPatch::default())
        .await
        .unwrap());
    assert_eq!(db.graph(salt).await.character(mara).unwrap().body_power, 3);
}

#[tokio::test]
async fn out_of_range_values_are_constraint_violations() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;
    let mara = db.graph(salt).await.primary_hero().unwrap().id;

    let patch = CharacterPatch {
        will_power: Some(-1),
        ..CharacterPatch::default()
    };
    let err = db.store.update_character(salt, mara, &patch).await.unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
}

#[tokio::test]
async fn rollback_floor_never_moves_back() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;

    db.store
        .advance_rollback_floor(salt, HistoryEntryId::new(10))
        .await
        .unwrap();
    db.store
        .advance_rollback_floor(salt, HistoryEntryId::new(4))
        .await
        .unwrap();

    let adventure = db.store.get(salt).await.unwrap().unwrap();
    assert_eq!(adventure.rollback_min_history_id, Some(HistoryEntryId::new(10)));
}

#[tokio::test]
async fn lock_on_missing_adventure_is_not_found() {
    let db = TestStore::new().await;
    let err = db.store.lock(AdventureId::new(42)).await.err().unwrap();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn lock_reads_and_cuts_history() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;
    let posts = db.append_posts(salt, 4).await;

    let mut lock = db.store.lock(salt).await.unwrap();
    assert_eq!(lock.last_history_entry().await.unwrap().unwrap().id, posts[3].id);
    assert_eq!(lock.delete_history_after(posts[1].id).await.unwrap(), 2);
    lock.commit().await.unwrap();

    let history = db.history(salt).await;
    assert_eq!(history.len(), 2);

    // Uncommitted deletes are rolled back
    let mut lock = db.store.lock(salt).await.unwrap();
    lock.delete_history_entry(posts[1].id).await.unwrap();
    drop(lock);
    assert_eq!(db.history(salt).await.len(), 2);
}

#[tokio::test]
async fn history_keeps_metadata_and_order() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;

    let mut entry = NewHistoryEntry::system(salt, "A bell rings.");
    entry
        .metadata
        .insert("source".into(), serde_json::json!("intro"));
    let stored = db.store.append(entry).await.unwrap();
    db.append_posts(salt, 2).await;

    let history = db.store.list(salt).await.unwrap();
    assert_eq!(history[0].id, stored.id);
    assert_eq!(history[0].metadata["source"], "intro");
    assert!(history.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn runs_are_listed_per_player_and_templates_by_id() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;
    let shore = db.import(NO_HERO).await;

    let templates = db.store.list_templates().await.unwrap();
    let ids: Vec<_> = templates.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![salt, shore]);

    assert!(db.store.list_runs(UserId::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn waiting_flags_reset_in_bulk() {
    let db = TestStore::new().await;
    let salt = db.import(SALT_ROADS).await;
    let shore = db.import(NO_HERO).await;
    db.store.set_waiting_ai(salt, true).await.unwrap();
    db.store.set_waiting_ai(shore, true).await.unwrap();

    assert_eq!(db.store.reset_stale_waiting_flags().await.unwrap(), 2);
    assert_eq!(db.store.reset_stale_waiting_flags().await.unwrap(), 0);
    assert!(!db.store.get(salt).await.unwrap().unwrap().is_waiting_ai);
}
