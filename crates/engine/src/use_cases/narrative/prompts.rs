//! Prompt rendering. Pure functions of the run's graph and a history slice.
//!
//! Every section is always present; empty state is rendered with a fixed
//! placeholder line so the model sees the same layout on every turn.

use serde_json::{json, Value};
use taleweaver_domain::{AdventureGraph, Character, HistoryEntry};

pub const EMPTY_HISTORY_PLACEHOLDER: &str = "The story has not started yet.";
pub const NO_PARTY_PLACEHOLDER: &str = "There are no heroes in the party.";
pub const NO_HERO_PLACEHOLDER: &str = "The main hero is not set.";
pub const UNKNOWN_LOCATION_PLACEHOLDER: &str = "Current location: unknown.";
pub const NO_LOCATION_CHARACTERS_PLACEHOLDER: &str = "There is nobody else at this location.";
pub const NO_ACTIVE_EVENTS_PLACEHOLDER: &str = "There are no active events.";

/// Word count hint for generated story paragraphs.
pub const GENERATION_WORD_LIMIT: &str = "40-50";

const NONE_MARK: &str = "-";

const GROWTH_RULES: &str = "Important: each level of a skill system makes its owner \
    geometrically more effective. The same holds for technique tiers.";

fn history_text(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return EMPTY_HISTORY_PLACEHOLDER.to_string();
    }
    entries
        .iter()
        .map(HistoryEntry::prompt_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn sorted_by_title<'a>(characters: impl Iterator<Item = &'a Character>) -> Vec<&'a Character> {
    let mut characters: Vec<_> = characters.collect();
    characters.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    characters
}

fn character_line(graph: &AdventureGraph, character: &Character, with_description: bool) -> String {
    let mut parts = vec![
        character.title.clone(),
        format!(
            "Body {} ({}%)",
            character.body_power, character.body_power_progress
        ),
        format!(
            "Mind {} ({}%)",
            character.mind_power, character.mind_power_progress
        ),
        format!(
            "Will {} ({}%)",
            character.will_power, character.will_power_progress
        ),
    ];
    if with_description && !character.description.is_empty() {
        parts.push(format!("Description: {}", character.description));
    }
    if let Some(race) = character.race_id.and_then(|id| graph.race(id)) {
        parts.push(format!("Race: {}", race.title));
    }
    if let Some(age) = character.age {
        parts.push(format!("Age: {age}"));
    }

    let systems: Vec<String> = graph
        .systems_of(character.id)
        .map(|known| {
            let title = graph
                .system(known.system_id)
                .map_or(NONE_MARK, |s| s.title.as_str());
            format!(
                "{title} (level {}, progress {}%)",
                known.level, known.progress_percent
            )
        })
        .collect();
    if !systems.is_empty() {
        parts.push(format!("Systems: {}", systems.join("; ")));
    }

    let techniques: Vec<&str> = graph
        .techniques_of(character.id)
        .map(|known| {
            graph
                .technique(known.technique_id)
                .map_or(NONE_MARK, |t| t.title.as_str())
        })
        .collect();
    if !techniques.is_empty() {
        parts.push(format!("Techniques: {}", techniques.join("; ")));
    }

    parts.join(" | ")
}

/// Prompt asking the model for the next story paragraph.
pub fn generation_prompt(graph: &AdventureGraph, window: &[HistoryEntry]) -> String {
    let hero = graph.primary_hero();
    let hero_text = match hero {
        Some(hero) => format!("Main hero: {}.", hero.title),
        None => NO_HERO_PLACEHOLDER.to_string(),
    };

    let location = hero
        .and_then(|h| h.location_id)
        .and_then(|id| graph.location(id));
    let location_text = match location {
        Some(location) if location.description.is_empty() => {
            format!("Current location: {}.", location.title)
        }
        Some(location) => format!(
            "Current location: {}. {}",
            location.title, location.description
        ),
        None => UNKNOWN_LOCATION_PLACEHOLDER.to_string(),
    };

    let mut system_titles: Vec<&str> = graph.systems.iter().map(|s| s.title.as_str()).collect();
    system_titles.sort_unstable();
    let systems_text = format!(
        "Available systems: {}",
        if system_titles.is_empty() {
            NONE_MARK.to_string()
        } else {
            system_titles.join(", ")
        }
    );

    let party = sorted_by_title(graph.party());

    let mut party_techniques: Vec<&str> = party
        .iter()
        .flat_map(|c| graph.techniques_of(c.id))
        .filter_map(|known| graph.technique(known.technique_id))
        .map(|t| t.title.as_str())
        .collect();
    party_techniques.sort_unstable();
    party_techniques.dedup();
    let party_techniques_text = format!(
        "Party techniques: {}",
        if party_techniques.is_empty() {
            NONE_MARK.to_string()
        } else {
            party_techniques.join(", ")
        }
    );

    let heroes_text = if party.is_empty() {
        NO_PARTY_PLACEHOLDER.to_string()
    } else {
        let lines: Vec<String> = party
            .iter()
            .map(|c| character_line(graph, c, false))
            .collect();
        format!("Party heroes:\n{}", lines.join("\n"))
    };

    let locals = location
        .map(|l| sorted_by_title(graph.characters_at(l.id)))
        .unwrap_or_default();
    let locals_text = if locals.is_empty() {
        NO_LOCATION_CHARACTERS_PLACEHOLDER.to_string()
    } else {
        let lines: Vec<String> = locals
            .iter()
            .map(|c| character_line(graph, c, true))
            .collect();
        format!("Characters at this location:\n{}", lines.join("\n"))
    };

    let mut events: Vec<_> = graph.active_events().collect();
    events.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    let events_text = if events.is_empty() {
        NO_ACTIVE_EVENTS_PLACEHOLDER.to_string()
    } else {
        let lines: Vec<String> = events
            .iter()
            .map(|e| {
                let state = if e.state.is_empty() {
                    NONE_MARK
                } else {
                    e.state.as_str()
                };
                format!("{}: {state}", e.title)
            })
            .collect();
        format!("Active events:\n{}", lines.join("\n"))
    };

    format!(
        "{hero_text}\n{GROWTH_RULES}\n{location_text}\n{systems_text}\n{party_techniques_text}\n\
         {heroes_text}\n{locals_text}\n{events_text}\n\n\
         {history}\n\n\
         Write the next paragraph of the story as a logical continuation of the plot. \
         Do not repeat or retell events already recorded in the history. \
         The answer should be about {GENERATION_WORD_LIMIT} words.",
        history = history_text(window),
    )
}

const CARD_UPDATE_SCHEMA: &str = r#"{"events":[{"id":1,"status":"active|resolved|inactive","state":"..."}],"characters":[{"id":1,"description":"...","body_power":0,"body_power_progress":0,"mind_power":0,"mind_power_progress":0,"will_power":0,"will_power_progress":0}],"character_systems":[{"id":1,"level":0,"progress_percent":0,"notes":"..."}],"character_techniques":[{"id":1,"notes":"..."}]}"#;

/// Prompt asking the model to fold `tail` into card updates. The strict
/// variant is used as a retry after an unparseable answer.
pub fn card_update_prompt(graph: &AdventureGraph, tail: &[HistoryEntry], strict: bool) -> String {
    let party = sorted_by_title(graph.party());
    let party_ids: Vec<_> = party.iter().map(|c| c.id).collect();

    let mut active_events: Vec<_> = graph.active_events().collect();
    active_events.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    let events: Vec<Value> = active_events
        .iter()
        .map(|e| json!({"id": e.id, "title": e.title, "state": e.state, "status": e.status}))
        .collect();

    let mut systems: Vec<_> = graph.systems.iter().collect();
    systems.sort_by(|a, b| a.title.cmp(&b.title));
    let systems: Vec<Value> = systems
        .iter()
        .map(|s| {
            json!({
                "id": s.id, "title": s.title, "description": s.description, "tags": s.tags,
                "w_body": s.w_body, "w_mind": s.w_mind, "w_will": s.w_will,
                "formula_hint": s.formula_hint,
            })
        })
        .collect();

    let mut techniques: Vec<_> = graph.techniques.iter().collect();
    techniques.sort_by(|a, b| a.title.cmp(&b.title));
    let techniques: Vec<Value> = techniques
        .iter()
        .map(|t| {
            json!({
                "id": t.id, "title": t.title, "description": t.description, "tags": t.tags,
                "difficulty": t.difficulty, "tier": t.tier,
                "required_system_level": t.required_system_level, "system_id": t.system_id,
            })
        })
        .collect();

    let party_cards: Vec<Value> = party
        .iter()
        .map(|c| {
            json!({
                "id": c.id, "title": c.title, "description": c.description,
                "body_power": c.body_power, "body_power_progress": c.body_power_progress,
                "mind_power": c.mind_power, "mind_power_progress": c.mind_power_progress,
                "will_power": c.will_power, "will_power_progress": c.will_power_progress,
            })
        })
        .collect();

    let party_systems: Vec<Value> = graph
        .character_systems
        .iter()
        .filter(|cs| party_ids.contains(&cs.character_id))
        .map(|cs| {
            json!({
                "id": cs.id, "character_id": cs.character_id, "system_id": cs.system_id,
                "level": cs.level, "progress_percent": cs.progress_percent, "notes": cs.notes,
            })
        })
        .collect();

    let party_techniques: Vec<Value> = graph
        .character_techniques
        .iter()
        .filter(|ct| party_ids.contains(&ct.character_id))
        .map(|ct| {
            json!({
                "id": ct.id, "character_id": ct.character_id,
                "technique_id": ct.technique_id, "notes": ct.notes,
            })
        })
        .collect();

    let rules_prefix = if strict {
        "Return only JSON, with no explanations and no markdown. "
    } else {
        "Return strictly JSON (no explanations) in this format:\n"
    };

    format!(
        "You are analysing the latest story events and updating the cards.\n\
         {rules_prefix}{CARD_UPDATE_SCHEMA}\n\
         Answer rules:\n\
         - Return only the records that changed.\n\
         - Do not return full unchanged lists.\n\
         - If nothing changed, return empty arrays.\n\
         - The JSON must be valid and fully closed.\n\n\
         Rules: skill system levels and technique tiers grow geometrically. \
         Stats grow gradually, through a progress percentage (0-100) towards the next value.\n\n\
         Latest history posts:\n{tail}\n\n\
         Active events: {events}\n\
         Available systems: {systems}\n\
         Available techniques: {techniques}\n\
         Party cards: {party_cards}\n\
         Party system knowledge: {party_systems}\n\
         Party learned techniques: {party_techniques}\n",
        tail = history_text(tail),
        events = Value::Array(events),
        systems = Value::Array(systems),
        techniques = Value::Array(techniques),
        party_cards = Value::Array(party_cards),
        party_systems = Value::Array(party_systems),
        party_techniques = Value::Array(party_techniques),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Map;
    use taleweaver_domain::{
        Adventure, AdventureEvent, AdventureId, CharacterId, EventId, EventStatus,
        HistoryEntryId, HistoryRole, Location, LocationId, UserId,
    };

    fn graph() -> AdventureGraph {
        AdventureGraph::empty(Adventure {
            id: AdventureId::new(1),
            author: UserId::new(),
            player: Some(UserId::new()),
            template_id: Some(AdventureId::new(0)),
            is_template: false,
            is_waiting_ai: false,
            rollback_min_history_id: None,
            primary_hero_id: None,
            title: "Ashen Road".to_string(),
            description: String::new(),
            intro: String::new(),
            spec_instructions: String::new(),
            created_at: Utc::now(),
        })
    }

    fn entry(id: i64, role: HistoryRole, content: &str) -> HistoryEntry {
        HistoryEntry {
            id: HistoryEntryId::new(id),
            adventure_id: AdventureId::new(1),
            role,
            content: content.to_string(),
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_state_renders_every_placeholder() {
        let prompt = generation_prompt(&graph(), &[]);

        for placeholder in [
            EMPTY_HISTORY_PLACEHOLDER,
            NO_PARTY_PLACEHOLDER,
            NO_HERO_PLACEHOLDER,
            UNKNOWN_LOCATION_PLACEHOLDER,
            NO_LOCATION_CHARACTERS_PLACEHOLDER,
            NO_ACTIVE_EVENTS_PLACEHOLDER,
        ] {
            assert!(prompt.contains(placeholder), "missing {placeholder:?}");
        }
        assert!(prompt.contains(GENERATION_WORD_LIMIT));
    }

    #[test]
    fn hero_location_party_and_events_are_rendered() {
        let mut graph = graph();
        graph.locations.push(Location {
            id: LocationId::new(5),
            adventure_id: AdventureId::new(1),
            title: "Harbor".to_string(),
            description: "Salt and tar.".to_string(),
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            tags: vec![],
        });
        let mut hero = Character::blank(AdventureId::new(1), "Mira");
        hero.id = CharacterId::new(9);
        hero.in_party = true;
        hero.location_id = Some(LocationId::new(5));
        hero.body_power = 3;
        graph.characters.push(hero);
        graph.adventure.primary_hero_id = Some(CharacterId::new(9));
        graph.events.push(AdventureEvent {
            id: EventId::new(2),
            adventure_id: AdventureId::new(1),
            location_id: None,
            status: EventStatus::Active,
            title: "Storm".to_string(),
            trigger_hint: String::new(),
            state: "Clouds gather".to_string(),
        });

        let prompt = generation_prompt(
            &graph,
            &[entry(1, HistoryRole::User, "Mira: I look around")],
        );

        assert!(prompt.contains("Main hero: Mira."));
        assert!(prompt.contains("Current location: Harbor. Salt and tar."));
        assert!(prompt.contains("Body 3 (0%)"));
        assert!(prompt.contains("Storm: Clouds gather"));
        assert!(prompt.contains("user: Mira: I look around"));
        assert!(!prompt.contains(NO_PARTY_PLACEHOLDER));
    }

    #[test]
    fn strict_card_prompt_changes_only_the_instruction() {
        let tail = [entry(3, HistoryRole::Ai, "The storm breaks.")];
        let normal = card_update_prompt(&graph(), &tail, false);
        let strict = card_update_prompt(&graph(), &tail, true);

        assert!(normal.contains("in this format"));
        assert!(strict.contains("Return only JSON"));
        assert!(strict.contains("ai: The storm breaks."));
        assert!(strict.contains(CARD_UPDATE_SCHEMA));
    }

    #[test]
    fn rendering_is_deterministic() {
        let tail = [entry(1, HistoryRole::System, "Intro")];
        assert_eq!(
            generation_prompt(&graph(), &tail),
            generation_prompt(&graph(), &tail)
        );
    }
}
