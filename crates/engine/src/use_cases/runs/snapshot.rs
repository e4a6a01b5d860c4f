//! Id-remapping materializer.
//!
//! Writes a source graph under a new adventure through a [`GraphWriter`],
//! translating every reference through the ids allocated so far. Records whose
//! required references did not map are dropped; optional references that did
//! not map are cleared. Cards are written in title order, join records in
//! source order.

use std::collections::HashMap;
use std::hash::Hash;

use taleweaver_domain::{
    AdventureEvent, AdventureGraph, AdventureId, Character, CharacterFaction,
    CharacterRelationship, CharacterSystem, CharacterTechnique, HeroSetup, NewAdventure,
    Technique,
};

use crate::infrastructure::ports::{GraphWriter, RepoError};

/// The new adventure and its primary hero as written, if the source had one
/// that mapped.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Materialized {
    pub adventure: AdventureId,
    pub primary_hero: Option<Character>,
    pub dropped: usize,
}

fn by_title<'a, T>(items: &'a [T], title: impl Fn(&T) -> &str) -> Vec<&'a T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| title(a).cmp(title(b)));
    sorted
}

fn remap<K: Eq + Hash + Copy>(map: &HashMap<K, K>, id: Option<K>) -> Option<K> {
    id.and_then(|id| map.get(&id).copied())
}

pub(crate) async fn materialize(
    writer: &mut dyn GraphWriter,
    target: &NewAdventure,
    source: &AdventureGraph,
) -> Result<Materialized, RepoError> {
    let adventure = writer.create_adventure(target).await?;
    let mut dropped = 0usize;

    let mut locations = HashMap::new();
    for location in by_title(&source.locations, |l| l.title.as_str()) {
        let id = writer.create_location(adventure, location).await?;
        locations.insert(location.id, id);
    }

    let mut races = HashMap::new();
    for race in by_title(&source.races, |r| r.title.as_str()) {
        let id = writer.create_race(adventure, race).await?;
        races.insert(race.id, id);
    }

    let setup = HeroSetup {
        default_location_id: remap(&locations, source.hero_setup.default_location_id),
        default_race_id: remap(&races, source.hero_setup.default_race_id),
        ..source.hero_setup.clone()
    };
    writer.save_hero_setup(adventure, &setup).await?;

    let mut systems = HashMap::new();
    for system in by_title(&source.systems, |s| s.title.as_str()) {
        let id = writer.create_system(adventure, system).await?;
        systems.insert(system.id, id);
    }

    let mut techniques = HashMap::new();
    for technique in by_title(&source.techniques, |t| t.title.as_str()) {
        let Some(&system_id) = systems.get(&technique.system_id) else {
            dropped += 1;
            continue;
        };
        let record = Technique {
            system_id,
            ..technique.clone()
        };
        let id = writer.create_technique(adventure, &record).await?;
        techniques.insert(technique.id, id);
    }

    let mut factions = HashMap::new();
    for faction in by_title(&source.factions, |f| f.title.as_str()) {
        let id = writer.create_faction(adventure, faction).await?;
        factions.insert(faction.id, id);
    }

    for info in by_title(&source.other_info, |i| i.title.as_str()) {
        writer.create_other_info(adventure, info).await?;
    }

    for event in by_title(&source.events, |e| e.title.as_str()) {
        let record = AdventureEvent {
            location_id: remap(&locations, event.location_id),
            ..event.clone()
        };
        writer.create_event(adventure, &record).await?;
    }

    let mut characters = HashMap::new();
    for character in by_title(&source.characters, |c| c.title.as_str()) {
        let record = Character {
            race_id: remap(&races, character.race_id),
            location_id: remap(&locations, character.location_id),
            ..character.clone()
        };
        let id = writer.create_character(adventure, &record).await?;
        characters.insert(character.id, id);
    }

    for link in &source.character_systems {
        let (Some(&character_id), Some(&system_id)) = (
            characters.get(&link.character_id),
            systems.get(&link.system_id),
        ) else {
            dropped += 1;
            continue;
        };
        let record = CharacterSystem {
            character_id,
            system_id,
            ..link.clone()
        };
        writer.create_character_system(adventure, &record).await?;
    }

    for link in &source.character_techniques {
        let (Some(&character_id), Some(&technique_id)) = (
            characters.get(&link.character_id),
            techniques.get(&link.technique_id),
        ) else {
            dropped += 1;
            continue;
        };
        let record = CharacterTechnique {
            character_id,
            technique_id,
            ..link.clone()
        };
        writer.create_character_technique(adventure, &record).await?;
    }

    for link in &source.character_factions {
        let (Some(&character_id), Some(&faction_id)) = (
            characters.get(&link.character_id),
            factions.get(&link.faction_id),
        ) else {
            dropped += 1;
            continue;
        };
        let record = CharacterFaction {
            character_id,
            faction_id,
            ..link.clone()
        };
        writer.create_character_faction(adventure, &record).await?;
    }

    for link in &source.relationships {
        let (Some(&from_character_id), Some(&to_character_id)) = (
            characters.get(&link.from_character_id),
            characters.get(&link.to_character_id),
        ) else {
            dropped += 1;
            continue;
        };
        let record = CharacterRelationship {
            from_character_id,
            to_character_id,
            ..link.clone()
        };
        writer.create_relationship(adventure, &record).await?;
    }

    let primary_hero = source.adventure.primary_hero_id.and_then(|old| {
        let new_id = characters.get(&old).copied()?;
        let hero = source.character(old)?;
        Some(Character {
            id: new_id,
            adventure_id: adventure,
            race_id: remap(&races, hero.race_id),
            location_id: remap(&locations, hero.location_id),
            ..hero.clone()
        })
    });
    if let Some(hero) = &primary_hero {
        writer.set_primary_hero(adventure, hero.id).await?;
    }

    if dropped > 0 {
        tracing::debug!(
            adventure_id = %adventure,
            dropped,
            "Dropped records with unmapped references"
        );
    }

    Ok(Materialized {
        adventure,
        primary_hero,
        dropped,
    })
}
