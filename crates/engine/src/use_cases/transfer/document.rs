//! Conversion between an [`AdventureGraph`] and the transfer document.
//!
//! Export numbers each card type from 1 in title order. Import assigns
//! placeholder row ids from the document's export ids and leaves reference
//! resolution to the materializer: an unresolved optional reference becomes
//! `None`, an unresolved required one points at id 0, which never maps.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use taleweaver_domain::{
    Adventure, AdventureEvent, AdventureGraph, AdventureId, Character, CharacterFaction,
    CharacterFactionId, CharacterId, CharacterRelationship, CharacterSystem, CharacterSystemId,
    CharacterTechnique, CharacterTechniqueId, EventId, EventStatus, Faction, FactionId, HeroSetup,
    Location, LocationId, OtherInfo, OtherInfoId, Race, RaceId, RelationshipId, SkillSystem,
    SkillSystemId, Technique, TechniqueId, UserId,
};
use taleweaver_shared::{
    ExportAdventure, ExportCharacter, ExportCharacterFaction, ExportCharacterSystem,
    ExportCharacterTechnique, ExportEvent, ExportFaction, ExportHeroSetup, ExportLocation,
    ExportOtherInfo, ExportRace, ExportRelationship, ExportSystem, ExportTechnique,
    TemplateExport, TEMPLATE_EXPORT_VERSION,
};

pub(crate) const IMPORTED_TITLE: &str = "Imported adventure";

const UNRESOLVED: i64 = 0;

/// Row id to export id, per card type.
struct ExportIds<K>(HashMap<K, String>);

impl<K: std::hash::Hash + Eq + Copy> ExportIds<K> {
    fn number(ids: impl IntoIterator<Item = K>) -> Self {
        Self(
            ids.into_iter()
                .enumerate()
                .map(|(index, id)| (id, (index + 1).to_string()))
                .collect(),
        )
    }

    fn of(&self, id: K) -> String {
        self.0.get(&id).cloned().unwrap_or_default()
    }

    fn of_opt(&self, id: Option<K>) -> Option<String> {
        id.and_then(|id| self.0.get(&id).cloned())
    }
}

pub(crate) fn export_graph(graph: &AdventureGraph) -> TemplateExport {
    let locations = ExportIds::number(graph.locations.iter().map(|l| l.id));
    let races = ExportIds::number(graph.races.iter().map(|r| r.id));
    let systems = ExportIds::number(graph.systems.iter().map(|s| s.id));
    let techniques = ExportIds::number(graph.techniques.iter().map(|t| t.id));
    let factions = ExportIds::number(graph.factions.iter().map(|f| f.id));
    let other_info = ExportIds::number(graph.other_info.iter().map(|i| i.id));
    let characters = ExportIds::number(graph.characters.iter().map(|c| c.id));
    let events = ExportIds::number(graph.events.iter().map(|e| e.id));

    let adventure = &graph.adventure;
    let setup = &graph.hero_setup;

    TemplateExport {
        version: TEMPLATE_EXPORT_VERSION,
        adventure: ExportAdventure {
            title: Some(adventure.title.clone()),
            description: adventure.description.clone(),
            spec_instructions: adventure.spec_instructions.clone(),
            intro: adventure.intro.clone(),
            primary_hero: characters.of_opt(adventure.primary_hero_id),
        },
        hero_setup: ExportHeroSetup {
            default_location: locations.of_opt(setup.default_location_id),
            require_race: setup.require_race,
            default_race: races.of_opt(setup.default_race_id),
            require_age: setup.require_age,
            default_age: setup.default_age,
            require_body_power: setup.require_body_power,
            default_body_power: setup.default_body_power,
            require_mind_power: setup.require_mind_power,
            default_mind_power: setup.default_mind_power,
            require_will_power: setup.require_will_power,
            default_will_power: setup.default_will_power,
            require_systems: setup.require_systems,
            require_techniques: setup.require_techniques,
        },
        locations: graph
            .locations
            .iter()
            .map(|l| ExportLocation {
                export_id: locations.of(l.id),
                title: l.title.clone(),
                description: l.description.clone(),
                x: l.x,
                y: l.y,
                width: l.width,
                height: l.height,
                tags: l.tags.clone(),
            })
            .collect(),
        races: graph
            .races
            .iter()
            .map(|r| ExportRace {
                export_id: races.of(r.id),
                title: r.title.clone(),
                description: r.description.clone(),
                life_span: r.life_span,
                tags: r.tags.clone(),
            })
            .collect(),
        systems: graph
            .systems
            .iter()
            .map(|s| ExportSystem {
                export_id: systems.of(s.id),
                title: s.title.clone(),
                description: s.description.clone(),
                tags: s.tags.clone(),
                w_body: s.w_body,
                w_mind: s.w_mind,
                w_will: s.w_will,
                formula_hint: s.formula_hint.clone(),
            })
            .collect(),
        techniques: graph
            .techniques
            .iter()
            .map(|t| ExportTechnique {
                export_id: techniques.of(t.id),
                system: systems.of_opt(Some(t.system_id)),
                title: t.title.clone(),
                description: t.description.clone(),
                tags: t.tags.clone(),
                difficulty: t.difficulty,
                tier: t.tier,
                required_system_level: t.required_system_level,
            })
            .collect(),
        factions: graph
            .factions
            .iter()
            .map(|f| ExportFaction {
                export_id: factions.of(f.id),
                title: f.title.clone(),
                description: f.description.clone(),
                tags: f.tags.clone(),
            })
            .collect(),
        other_info: graph
            .other_info
            .iter()
            .map(|i| ExportOtherInfo {
                export_id: other_info.of(i.id),
                category: i.category.clone(),
                title: i.title.clone(),
                description: i.description.clone(),
                tags: i.tags.clone(),
            })
            .collect(),
        characters: graph
            .characters
            .iter()
            .map(|c| ExportCharacter {
                export_id: characters.of(c.id),
                title: c.title.clone(),
                description: c.description.clone(),
                is_player: c.is_player,
                in_party: c.in_party,
                age: c.age,
                body_power: c.body_power,
                body_power_progress: c.body_power_progress,
                mind_power: c.mind_power,
                mind_power_progress: c.mind_power_progress,
                will_power: c.will_power,
                will_power_progress: c.will_power_progress,
                tags: c.tags.clone(),
                race: races.of_opt(c.race_id),
                location: locations.of_opt(c.location_id),
            })
            .collect(),
        events: graph
            .events
            .iter()
            .map(|e| ExportEvent {
                export_id: events.of(e.id),
                title: e.title.clone(),
                status: e.status.as_str().to_string(),
                trigger_hint: e.trigger_hint.clone(),
                state: e.state.clone(),
                location: locations.of_opt(e.location_id),
            })
            .collect(),
        character_systems: graph
            .character_systems
            .iter()
            .map(|link| ExportCharacterSystem {
                character: characters.of_opt(Some(link.character_id)),
                system: systems.of_opt(Some(link.system_id)),
                level: link.level,
                progress_percent: link.progress_percent,
                notes: link.notes.clone(),
            })
            .collect(),
        character_techniques: graph
            .character_techniques
            .iter()
            .map(|link| ExportCharacterTechnique {
                character: characters.of_opt(Some(link.character_id)),
                technique: techniques.of_opt(Some(link.technique_id)),
                notes: link.notes.clone(),
            })
            .collect(),
        character_factions: graph
            .character_factions
            .iter()
            .map(|link| ExportCharacterFaction {
                character: characters.of_opt(Some(link.character_id)),
                faction: factions.of_opt(Some(link.faction_id)),
                role: link.role.clone(),
                notes: link.notes.clone(),
            })
            .collect(),
        relationships: graph
            .relationships
            .iter()
            .map(|link| ExportRelationship {
                from_character: characters.of_opt(Some(link.from_character_id)),
                to_character: characters.of_opt(Some(link.to_character_id)),
                kind: link.kind.clone(),
                description: link.description.clone(),
            })
            .collect(),
    }
}

/// Export id to placeholder row id, per card type.
struct ImportIds<'a>(HashMap<&'a str, i64>);

impl<'a> ImportIds<'a> {
    fn number(export_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self(export_ids.into_iter().zip(1..).collect())
    }

    fn of(&self, export_id: &str) -> i64 {
        self.0.get(export_id).copied().unwrap_or(UNRESOLVED)
    }

    fn resolve(&self, export_id: Option<&str>) -> Option<i64> {
        export_id.and_then(|id| self.0.get(id).copied())
    }

    fn required(&self, export_id: Option<&str>) -> i64 {
        self.resolve(export_id).unwrap_or(UNRESOLVED)
    }
}

/// Builds the source graph of an import. Placeholder ids are only
/// meaningful for the materializer.
pub(crate) fn import_graph(
    document: &TemplateExport,
    author: UserId,
    now: DateTime<Utc>,
) -> AdventureGraph {
    let locations = ImportIds::number(document.locations.iter().map(|l| l.export_id.as_str()));
    let races = ImportIds::number(document.races.iter().map(|r| r.export_id.as_str()));
    let systems = ImportIds::number(document.systems.iter().map(|s| s.export_id.as_str()));
    let techniques = ImportIds::number(document.techniques.iter().map(|t| t.export_id.as_str()));
    let factions = ImportIds::number(document.factions.iter().map(|f| f.export_id.as_str()));
    let other_info = ImportIds::number(document.other_info.iter().map(|i| i.export_id.as_str()));
    let characters = ImportIds::number(document.characters.iter().map(|c| c.export_id.as_str()));
    let events = ImportIds::number(document.events.iter().map(|e| e.export_id.as_str()));

    let placeholder = AdventureId::new(UNRESOLVED);
    let meta = &document.adventure;
    let setup = &document.hero_setup;

    let adventure = Adventure {
        id: placeholder,
        author,
        player: None,
        template_id: None,
        is_template: true,
        is_waiting_ai: false,
        rollback_min_history_id: None,
        primary_hero_id: characters
            .resolve(meta.primary_hero.as_deref())
            .map(CharacterId::new),
        title: meta
            .title
            .clone()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| IMPORTED_TITLE.to_string()),
        description: meta.description.clone(),
        intro: meta.intro.clone(),
        spec_instructions: meta.spec_instructions.clone(),
        created_at: now,
    };

    AdventureGraph {
        adventure,
        hero_setup: HeroSetup {
            default_location_id: locations
                .resolve(setup.default_location.as_deref())
                .map(LocationId::new),
            require_race: setup.require_race,
            default_race_id: races
                .resolve(setup.default_race.as_deref())
                .map(RaceId::new),
            require_age: setup.require_age,
            default_age: setup.default_age,
            require_body_power: setup.require_body_power,
            default_body_power: setup.default_body_power,
            require_mind_power: setup.require_mind_power,
            default_mind_power: setup.default_mind_power,
            require_will_power: setup.require_will_power,
            default_will_power: setup.default_will_power,
            require_systems: setup.require_systems,
            require_techniques: setup.require_techniques,
        },
        locations: document
            .locations
            .iter()
            .map(|l| Location {
                id: LocationId::new(locations.of(&l.export_id)),
                adventure_id: placeholder,
                title: l.title.clone(),
                description: l.description.clone(),
                x: l.x,
                y: l.y,
                width: l.width,
                height: l.height,
                tags: l.tags.clone(),
            })
            .collect(),
        races: document
            .races
            .iter()
            .map(|r| Race {
                id: RaceId::new(races.of(&r.export_id)),
                adventure_id: placeholder,
                title: r.title.clone(),
                description: r.description.clone(),
                life_span: r.life_span,
                tags: r.tags.clone(),
            })
            .collect(),
        systems: document
            .systems
            .iter()
            .map(|s| SkillSystem {
                id: SkillSystemId::new(systems.of(&s.export_id)),
                adventure_id: placeholder,
                title: s.title.clone(),
                description: s.description.clone(),
                w_body: s.w_body,
                w_mind: s.w_mind,
                w_will: s.w_will,
                formula_hint: s.formula_hint.clone(),
                tags: s.tags.clone(),
            })
            .collect(),
        techniques: document
            .techniques
            .iter()
            .map(|t| Technique {
                id: TechniqueId::new(techniques.of(&t.export_id)),
                adventure_id: placeholder,
                system_id: SkillSystemId::new(systems.required(t.system.as_deref())),
                title: t.title.clone(),
                description: t.description.clone(),
                difficulty: t.difficulty,
                tier: t.tier,
                required_system_level: t.required_system_level,
                tags: t.tags.clone(),
            })
            .collect(),
        factions: document
            .factions
            .iter()
            .map(|f| Faction {
                id: FactionId::new(factions.of(&f.export_id)),
                adventure_id: placeholder,
                title: f.title.clone(),
                description: f.description.clone(),
                tags: f.tags.clone(),
            })
            .collect(),
        other_info: document
            .other_info
            .iter()
            .map(|i| OtherInfo {
                id: OtherInfoId::new(other_info.of(&i.export_id)),
                adventure_id: placeholder,
                category: i.category.clone(),
                title: i.title.clone(),
                description: i.description.clone(),
                tags: i.tags.clone(),
            })
            .collect(),
        events: document
            .events
            .iter()
            .map(|e| AdventureEvent {
                id: EventId::new(events.of(&e.export_id)),
                adventure_id: placeholder,
                location_id: locations.resolve(e.location.as_deref()).map(LocationId::new),
                status: e.status.parse().unwrap_or(EventStatus::Inactive),
                title: e.title.clone(),
                trigger_hint: e.trigger_hint.clone(),
                state: e.state.clone(),
            })
            .collect(),
        characters: document
            .characters
            .iter()
            .map(|c| Character {
                id: CharacterId::new(characters.of(&c.export_id)),
                adventure_id: placeholder,
                race_id: races.resolve(c.race.as_deref()).map(RaceId::new),
                location_id: locations.resolve(c.location.as_deref()).map(LocationId::new),
                is_player: c.is_player,
                in_party: c.in_party,
                title: c.title.clone(),
                description: c.description.clone(),
                age: c.age,
                body_power: c.body_power,
                body_power_progress: c.body_power_progress,
                mind_power: c.mind_power,
                mind_power_progress: c.mind_power_progress,
                will_power: c.will_power,
                will_power_progress: c.will_power_progress,
                tags: c.tags.clone(),
            })
            .collect(),
        character_systems: document
            .character_systems
            .iter()
            .map(|link| CharacterSystem {
                id: CharacterSystemId::new(UNRESOLVED),
                adventure_id: placeholder,
                character_id: CharacterId::new(characters.required(link.character.as_deref())),
                system_id: SkillSystemId::new(systems.required(link.system.as_deref())),
                level: link.level,
                progress_percent: link.progress_percent,
                notes: link.notes.clone(),
            })
            .collect(),
        character_techniques: document
            .character_techniques
            .iter()
            .map(|link| CharacterTechnique {
                id: CharacterTechniqueId::new(UNRESOLVED),
                adventure_id: placeholder,
                character_id: CharacterId::new(characters.required(link.character.as_deref())),
                technique_id: TechniqueId::new(techniques.required(link.technique.as_deref())),
                notes: link.notes.clone(),
                learned_at: now,
            })
            .collect(),
        character_factions: document
            .character_factions
            .iter()
            .map(|link| CharacterFaction {
                id: CharacterFactionId::new(UNRESOLVED),
                adventure_id: placeholder,
                character_id: CharacterId::new(characters.required(link.character.as_deref())),
                faction_id: FactionId::new(factions.required(link.faction.as_deref())),
                role: link.role.clone(),
                notes: link.notes.clone(),
            })
            .collect(),
        relationships: document
            .relationships
            .iter()
            .map(|link| CharacterRelationship {
                id: RelationshipId::new(UNRESOLVED),
                adventure_id: placeholder,
                from_character_id: CharacterId::new(
                    characters.required(link.from_character.as_deref()),
                ),
                to_character_id: CharacterId::new(
                    characters.required(link.to_character.as_deref()),
                ),
                kind: link.kind.clone(),
                description: link.description.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn document() -> TemplateExport {
        serde_json::from_value(serde_json::json!({
            "version": 2,
            "adventure": {"title": "Salt Roads", "primary_hero": "1"},
            "locations": [{"export_id": "1", "title": "Harbor"}],
            "systems": [{"export_id": "1", "title": "Tides", "w_body": 1}],
            "techniques": [
                {"export_id": "1", "system": "1", "title": "Undertow"},
                {"export_id": "2", "system": "9", "title": "Orphan"}
            ],
            "characters": [
                {"export_id": "1", "title": "Mara", "location": "1", "race": "404"}
            ],
            "character_techniques": [
                {"character": "1", "technique": "1"},
                {"character": "7", "technique": "1"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn import_resolves_known_references() {
        let graph = import_graph(&document(), UserId::new(), now());

        assert_eq!(graph.adventure.title, "Salt Roads");
        assert_eq!(graph.adventure.primary_hero_id, Some(CharacterId::new(1)));
        let mara = &graph.characters[0];
        assert_eq!(mara.location_id, Some(LocationId::new(1)));
        assert_eq!(mara.race_id, None);
        assert_eq!(graph.techniques[0].system_id, SkillSystemId::new(1));
    }

    #[test]
    fn unresolved_required_references_point_nowhere() {
        let graph = import_graph(&document(), UserId::new(), now());

        assert_eq!(graph.techniques[1].system_id.get(), UNRESOLVED);
        assert_eq!(graph.character_techniques[1].character_id.get(), UNRESOLVED);
    }

    #[test]
    fn missing_title_falls_back() {
        let mut doc = document();
        doc.adventure.title = None;
        let graph = import_graph(&doc, UserId::new(), now());
        assert_eq!(graph.adventure.title, IMPORTED_TITLE);
    }

    #[test]
    fn export_numbers_cards_and_links_references() {
        let imported = import_graph(&document(), UserId::new(), now());
        let exported = export_graph(&imported);

        assert_eq!(exported.version, TEMPLATE_EXPORT_VERSION);
        assert_eq!(exported.adventure.primary_hero.as_deref(), Some("1"));
        assert_eq!(exported.techniques[0].system.as_deref(), Some("1"));
        assert_eq!(exported.techniques[1].system, None);
        assert_eq!(exported.characters[0].location.as_deref(), Some("1"));
    }
}
