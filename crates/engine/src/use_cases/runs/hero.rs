//! Primary hero creation for a fresh run.

use std::sync::Arc;

use taleweaver_domain::{
    render_intro, AdventureGraph, AdventureId, Character, CharacterId, CharacterSystem,
    CharacterSystemId, CharacterTechnique, CharacterTechniqueId, HeroSetup, Location, LocationId,
    NewHistoryEntry, RaceId, SkillSystemId, TechniqueId,
};
use taleweaver_shared::CreateHeroRequest;

use super::RunError;
use crate::infrastructure::ports::{ClockPort, GraphRepo, GraphWriter};

const DEFAULT_HERO_TITLE: &str = "Hero";

/// Creates the player's hero under the run's hero setup rules.
pub struct CreatePrimaryHero {
    graphs: Arc<dyn GraphRepo>,
    clock: Arc<dyn ClockPort>,
}

/// Hero fields after the setup rules were applied.
struct ResolvedHero {
    character: Character,
    location: LocationChoice,
    systems: Vec<CharacterSystem>,
    techniques: Vec<CharacterTechnique>,
}

enum LocationChoice {
    Existing(LocationId),
    Create(Location),
}

impl CreatePrimaryHero {
    pub fn new(graphs: Arc<dyn GraphRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self { graphs, clock }
    }

    /// Writes everything in one transaction.
    pub async fn execute(
        &self,
        run: AdventureId,
        request: &CreateHeroRequest,
    ) -> Result<CharacterId, RunError> {
        let mut writer = self.graphs.begin_write().await?;

        let graph = writer
            .load(run)
            .await?
            .filter(|graph| graph.adventure.is_run())
            .ok_or_else(|| RunError::NotFound(format!("Run not found: {run}")))?;
        if graph.adventure.primary_hero_id.is_some() {
            return Err(RunError::validation("Primary hero already exists"));
        }

        let resolved = self.resolve(&graph, request)?;
        let hero_id = write_hero(writer.as_mut(), run, &graph.adventure.intro, resolved).await?;

        writer.commit().await?;
        tracing::info!(adventure_id = %run, hero_id = %hero_id, "Primary hero created");
        Ok(hero_id)
    }

    fn resolve(
        &self,
        graph: &AdventureGraph,
        request: &CreateHeroRequest,
    ) -> Result<ResolvedHero, RunError> {
        let run = graph.adventure.id;
        let setup = &graph.hero_setup;
        let hero = &request.hero;

        check_required(setup, request)?;

        let location_title = request
            .location_title
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        let location = match (setup.default_location_id, request.location_id) {
            (Some(default), _) => LocationChoice::Existing(default),
            (None, Some(id)) => {
                let location = graph
                    .location(LocationId::new(id))
                    .ok_or_else(|| RunError::validation("Location not found"))?;
                LocationChoice::Existing(location.id)
            }
            (None, None) if !location_title.is_empty() => LocationChoice::Create(Location {
                id: LocationId::new(0),
                adventure_id: run,
                title: location_title.to_string(),
                description: request.location_description.clone().unwrap_or_default(),
                x: 0,
                y: 0,
                width: 1,
                height: 1,
                tags: Vec::new(),
            }),
            (None, None) => return Err(RunError::validation("Location is required")),
        };

        let race_id = match hero.race {
            Some(id) => Some(
                graph
                    .race(RaceId::new(id))
                    .ok_or_else(|| RunError::validation("Race not found"))?
                    .id,
            ),
            None => setup.default_race_id,
        };

        let title = hero
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(DEFAULT_HERO_TITLE);

        let character = Character {
            race_id,
            is_player: true,
            in_party: true,
            description: hero.description.clone().unwrap_or_default(),
            age: hero.age.or(setup.default_age),
            body_power: hero.body_power.or(setup.default_body_power).unwrap_or(0),
            mind_power: hero.mind_power.or(setup.default_mind_power).unwrap_or(0),
            will_power: hero.will_power.or(setup.default_will_power).unwrap_or(0),
            tags: hero.tags.clone(),
            ..Character::blank(run, title)
        };
        character.validate()?;

        let mut systems = Vec::with_capacity(request.systems.len());
        for choice in &request.systems {
            let system = graph
                .system(SkillSystemId::new(choice.system))
                .ok_or_else(|| RunError::validation("System not found"))?;
            let link = CharacterSystem {
                id: CharacterSystemId::new(0),
                adventure_id: run,
                character_id: CharacterId::new(0),
                system_id: system.id,
                level: choice.level,
                progress_percent: choice.progress_percent,
                notes: choice.notes.clone(),
            };
            link.validate()?;
            systems.push(link);
        }

        let learned_at = self.clock.now();
        let mut techniques = Vec::with_capacity(request.techniques.len());
        for choice in &request.techniques {
            let technique = graph
                .technique(TechniqueId::new(choice.technique))
                .ok_or_else(|| RunError::validation("Technique not found"))?;
            techniques.push(CharacterTechnique {
                id: CharacterTechniqueId::new(0),
                adventure_id: run,
                character_id: CharacterId::new(0),
                technique_id: technique.id,
                notes: choice.notes.clone(),
                learned_at,
            });
        }

        Ok(ResolvedHero {
            character,
            location,
            systems,
            techniques,
        })
    }
}

fn check_required(setup: &HeroSetup, request: &CreateHeroRequest) -> Result<(), RunError> {
    let hero = &request.hero;
    let missing = [
        (setup.require_race && hero.race.is_none(), "Race is required"),
        (setup.require_age && hero.age.is_none(), "Age is required"),
        (
            setup.require_body_power && hero.body_power.is_none(),
            "Body power is required",
        ),
        (
            setup.require_mind_power && hero.mind_power.is_none(),
            "Mind power is required",
        ),
        (
            setup.require_will_power && hero.will_power.is_none(),
            "Will power is required",
        ),
        (
            setup.require_systems && request.systems.is_empty(),
            "At least one system is required",
        ),
        (
            setup.require_techniques && request.techniques.is_empty(),
            "At least one technique is required",
        ),
    ];
    match missing.iter().find(|(is_missing, _)| *is_missing) {
        Some((_, message)) => Err(RunError::validation(*message)),
        None => Ok(()),
    }
}

async fn write_hero(
    writer: &mut dyn GraphWriter,
    run: AdventureId,
    intro: &str,
    resolved: ResolvedHero,
) -> Result<CharacterId, RunError> {
    let location_id = match resolved.location {
        LocationChoice::Existing(id) => id,
        LocationChoice::Create(location) => writer.create_location(run, &location).await?,
    };

    let hero = Character {
        location_id: Some(location_id),
        ..resolved.character
    };
    let hero_id = writer.create_character(run, &hero).await?;

    for link in resolved.systems {
        let link = CharacterSystem {
            character_id: hero_id,
            ..link
        };
        writer.create_character_system(run, &link).await?;
    }
    for link in resolved.techniques {
        let link = CharacterTechnique {
            character_id: hero_id,
            ..link
        };
        writer.create_character_technique(run, &link).await?;
    }

    writer.set_primary_hero(run, hero_id).await?;

    if let Some(intro) = render_intro(intro, &hero.title) {
        writer
            .append_history(&NewHistoryEntry::system(run, intro))
            .await?;
    }

    Ok(hero_id)
}
