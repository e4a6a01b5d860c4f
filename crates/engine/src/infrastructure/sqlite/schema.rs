//! Store schema.
//!
//! Every card table carries `adventure_id` and cascades from `adventures`.
//! Triggers reject any reference to a record owned by another adventure, so a
//! half-remapped clone can never be committed.

use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS adventures (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        author TEXT NOT NULL,
        player TEXT,
        template_id INTEGER REFERENCES adventures(id) ON DELETE SET NULL,
        is_template INTEGER NOT NULL,
        is_waiting_ai INTEGER NOT NULL DEFAULT 0,
        rollback_min_history_id INTEGER,
        primary_hero_id INTEGER REFERENCES characters(id) ON DELETE SET NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        intro TEXT NOT NULL DEFAULT '',
        spec_instructions TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        CHECK (
            (is_template = 1 AND player IS NULL AND template_id IS NULL)
            OR (is_template = 0 AND player IS NOT NULL)
        )
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS hero_setups (
        adventure_id INTEGER PRIMARY KEY REFERENCES adventures(id) ON DELETE CASCADE,
        default_location_id INTEGER REFERENCES locations(id) ON DELETE SET NULL,
        require_race INTEGER NOT NULL DEFAULT 1,
        default_race_id INTEGER REFERENCES races(id) ON DELETE SET NULL,
        require_age INTEGER NOT NULL DEFAULT 0,
        default_age INTEGER CHECK (default_age IS NULL OR default_age >= 0),
        require_body_power INTEGER NOT NULL DEFAULT 1,
        default_body_power INTEGER CHECK (default_body_power IS NULL OR default_body_power >= 0),
        require_mind_power INTEGER NOT NULL DEFAULT 1,
        default_mind_power INTEGER CHECK (default_mind_power IS NULL OR default_mind_power >= 0),
        require_will_power INTEGER NOT NULL DEFAULT 1,
        default_will_power INTEGER CHECK (default_will_power IS NULL OR default_will_power >= 0),
        require_systems INTEGER NOT NULL DEFAULT 0,
        require_techniques INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        x INTEGER NOT NULL DEFAULT 0,
        y INTEGER NOT NULL DEFAULT 0,
        width INTEGER NOT NULL CHECK (width > 0),
        height INTEGER NOT NULL CHECK (height > 0),
        tags TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS races (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        life_span INTEGER NOT NULL DEFAULT 100 CHECK (life_span >= 0),
        tags TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS skill_systems (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        w_body INTEGER NOT NULL DEFAULT 0 CHECK (w_body >= 0),
        w_mind INTEGER NOT NULL DEFAULT 0 CHECK (w_mind >= 0),
        w_will INTEGER NOT NULL DEFAULT 0 CHECK (w_will >= 0),
        formula_hint TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '[]',
        CHECK (w_body + w_mind + w_will > 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS techniques (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        system_id INTEGER NOT NULL REFERENCES skill_systems(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        difficulty INTEGER NOT NULL DEFAULT 0 CHECK (difficulty >= 0),
        tier INTEGER CHECK (tier IS NULL OR tier >= 0),
        required_system_level INTEGER NOT NULL DEFAULT 0 CHECK (required_system_level >= 0),
        tags TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS factions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS other_info (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        category TEXT NOT NULL DEFAULT '',
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS characters (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        race_id INTEGER REFERENCES races(id) ON DELETE SET NULL,
        location_id INTEGER REFERENCES locations(id) ON DELETE SET NULL,
        is_player INTEGER NOT NULL DEFAULT 0,
        in_party INTEGER NOT NULL DEFAULT 0,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        age INTEGER CHECK (age IS NULL OR age >= 0),
        body_power INTEGER NOT NULL DEFAULT 0 CHECK (body_power >= 0),
        body_power_progress INTEGER NOT NULL DEFAULT 0 CHECK (body_power_progress BETWEEN 0 AND 100),
        mind_power INTEGER NOT NULL DEFAULT 0 CHECK (mind_power >= 0),
        mind_power_progress INTEGER NOT NULL DEFAULT 0 CHECK (mind_power_progress BETWEEN 0 AND 100),
        will_power INTEGER NOT NULL DEFAULT 0 CHECK (will_power >= 0),
        will_power_progress INTEGER NOT NULL DEFAULT 0 CHECK (will_power_progress BETWEEN 0 AND 100),
        tags TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS adventure_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        location_id INTEGER REFERENCES locations(id) ON DELETE SET NULL,
        status TEXT NOT NULL DEFAULT 'inactive' CHECK (status IN ('inactive', 'active', 'resolved')),
        title TEXT NOT NULL,
        trigger_hint TEXT NOT NULL DEFAULT '',
        state TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS character_systems (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        character_id INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
        system_id INTEGER NOT NULL REFERENCES skill_systems(id) ON DELETE CASCADE,
        level INTEGER NOT NULL DEFAULT 0 CHECK (level >= 0),
        progress_percent INTEGER NOT NULL DEFAULT 0 CHECK (progress_percent BETWEEN 0 AND 100),
        notes TEXT NOT NULL DEFAULT '',
        UNIQUE (character_id, system_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS character_techniques (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        character_id INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
        technique_id INTEGER NOT NULL REFERENCES techniques(id) ON DELETE CASCADE,
        notes TEXT NOT NULL DEFAULT '',
        learned_at TEXT NOT NULL,
        UNIQUE (character_id, technique_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS character_factions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        character_id INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
        faction_id INTEGER NOT NULL REFERENCES factions(id) ON DELETE CASCADE,
        role TEXT NOT NULL DEFAULT '',
        notes TEXT NOT NULL DEFAULT '',
        UNIQUE (character_id, faction_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS character_relationships (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        from_character_id INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
        to_character_id INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
        kind TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        CHECK (from_character_id <> to_character_id),
        UNIQUE (from_character_id, to_character_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS adventure_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        adventure_id INTEGER NOT NULL REFERENCES adventures(id) ON DELETE CASCADE,
        role TEXT NOT NULL CHECK (role IN ('user', 'ai', 'system')),
        content TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_history_adventure ON adventure_history(adventure_id, id)",
    "CREATE INDEX IF NOT EXISTS idx_adventures_player ON adventures(player, created_at)",
];

/// `(table, owner column, reference column, referenced table)` pairs that
/// must stay inside one adventure.
const SAME_ADVENTURE_REFERENCES: &[(&str, &str, &str, &str)] = &[
    ("adventures", "id", "primary_hero_id", "characters"),
    ("hero_setups", "adventure_id", "default_location_id", "locations"),
    ("hero_setups", "adventure_id", "default_race_id", "races"),
    ("techniques", "adventure_id", "system_id", "skill_systems"),
    ("characters", "adventure_id", "race_id", "races"),
    ("characters", "adventure_id", "location_id", "locations"),
    ("adventure_events", "adventure_id", "location_id", "locations"),
    ("character_systems", "adventure_id", "character_id", "characters"),
    ("character_systems", "adventure_id", "system_id", "skill_systems"),
    ("character_techniques", "adventure_id", "character_id", "characters"),
    ("character_techniques", "adventure_id", "technique_id", "techniques"),
    ("character_factions", "adventure_id", "character_id", "characters"),
    ("character_factions", "adventure_id", "faction_id", "factions"),
    ("character_relationships", "adventure_id", "from_character_id", "characters"),
    ("character_relationships", "adventure_id", "to_character_id", "characters"),
];

/// Marker in the abort message of the consistency triggers.
pub(crate) const CROSS_ADVENTURE_MARKER: &str = "cross-adventure reference";

fn same_adventure_triggers(
    table: &str,
    owner: &str,
    column: &str,
    target: &str,
) -> [String; 2] {
    let guard = format!(
        "WHEN NEW.{column} IS NOT NULL \
         AND (SELECT adventure_id FROM {target} WHERE id = NEW.{column}) IS NOT NEW.{owner} \
         BEGIN SELECT RAISE(ABORT, '{CROSS_ADVENTURE_MARKER}: {table}.{column}'); END"
    );
    [
        format!(
            "CREATE TRIGGER IF NOT EXISTS {table}_{column}_scope_insert \
             BEFORE INSERT ON {table} {guard}"
        ),
        format!(
            "CREATE TRIGGER IF NOT EXISTS {table}_{column}_scope_update \
             BEFORE UPDATE OF {column} ON {table} {guard}"
        ),
    ]
}

/// Creates tables, indexes and triggers. Idempotent.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    for statement in TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("schema", e))?;
    }

    for (table, owner, column, target) in SAME_ADVENTURE_REFERENCES {
        for statement in same_adventure_triggers(table, owner, column, target) {
            sqlx::query(&statement)
                .execute(pool)
                .await
                .map_err(|e| RepoError::database("schema", e))?;
        }
    }

    tracing::debug!("Store schema ensured");
    Ok(())
}
