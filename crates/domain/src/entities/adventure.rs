//! Adventure entity - a reusable template or a player's live run.
//!
//! A template is authored and never played. A run is a deep copy of a template
//! owned by one player; every card it references is its own copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{AdventureId, CharacterId, HistoryEntryId, UserId};

/// Token in an intro text replaced by the primary hero's title.
pub const MAIN_HERO_PLACEHOLDER: &str = "<main_hero>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adventure {
    pub id: AdventureId,
    pub author: UserId,
    /// Set only on runs.
    pub player: Option<UserId>,
    /// The template a run was started from. Set only on runs.
    pub template_id: Option<AdventureId>,
    pub is_template: bool,
    /// Single-flight latch for AI round-trips.
    pub is_waiting_ai: bool,
    /// Oldest history entry that may still be rolled back to.
    pub rollback_min_history_id: Option<HistoryEntryId>,
    pub primary_hero_id: Option<CharacterId>,
    pub title: String,
    pub description: String,
    /// Opening text, may contain [`MAIN_HERO_PLACEHOLDER`].
    pub intro: String,
    pub spec_instructions: String,
    pub created_at: DateTime<Utc>,
}

impl Adventure {
    pub fn is_run(&self) -> bool {
        !self.is_template
    }

    pub fn is_owned_by_player(&self, player: UserId) -> bool {
        self.player == Some(player)
    }

    /// Whether history may be cut back to `entry_id`.
    ///
    /// Entries older than the watermark were folded into cards by compaction
    /// and cannot be restored.
    pub fn allows_rollback_to(&self, entry_id: HistoryEntryId) -> bool {
        match self.rollback_min_history_id {
            Some(floor) => entry_id >= floor,
            None => true,
        }
    }

    /// Renders the intro for the given hero, or `None` when there is no intro.
    pub fn render_intro(&self, hero_title: &str) -> Option<String> {
        render_intro(&self.intro, hero_title)
    }
}

pub fn render_intro(intro: &str, hero_title: &str) -> Option<String> {
    if intro.is_empty() {
        return None;
    }
    Some(intro.replace(MAIN_HERO_PLACEHOLDER, hero_title))
}

/// Data required to create an adventure row.
///
/// Only constructible through [`NewAdventure::template`] and
/// [`NewAdventure::run_of`], so a template never carries a player and a run
/// always does.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAdventure {
    author: UserId,
    player: Option<UserId>,
    template_id: Option<AdventureId>,
    pub title: String,
    pub description: String,
    pub intro: String,
    pub spec_instructions: String,
}

impl NewAdventure {
    pub fn template(author: UserId, title: impl Into<String>) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("Adventure title cannot be empty"));
        }
        Ok(Self {
            author,
            player: None,
            template_id: None,
            title,
            description: String::new(),
            intro: String::new(),
            spec_instructions: String::new(),
        })
    }

    /// A run of `template` for `player`, copying the template's texts.
    pub fn run_of(template: &Adventure, player: UserId) -> Result<Self, DomainError> {
        if !template.is_template {
            return Err(DomainError::constraint(format!(
                "Adventure {} is not a template",
                template.id
            )));
        }
        Ok(Self {
            author: template.author,
            player: Some(player),
            template_id: Some(template.id),
            title: template.title.clone(),
            description: template.description.clone(),
            intro: template.intro.clone(),
            spec_instructions: template.spec_instructions.clone(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = intro.into();
        self
    }

    pub fn with_spec_instructions(mut self, spec_instructions: impl Into<String>) -> Self {
        self.spec_instructions = spec_instructions.into();
        self
    }

    pub fn author(&self) -> UserId {
        self.author
    }

    pub fn player(&self) -> Option<UserId> {
        self.player
    }

    pub fn template_id(&self) -> Option<AdventureId> {
        self.template_id
    }

    pub fn is_template(&self) -> bool {
        self.player.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Adventure {
        Adventure {
            id: AdventureId::new(7),
            author: UserId::new(),
            player: None,
            template_id: None,
            is_template: true,
            is_waiting_ai: false,
            rollback_min_history_id: None,
            primary_hero_id: None,
            title: "Ashen Road".to_string(),
            description: "A road through cinders".to_string(),
            intro: "<main_hero> wakes up in the ash.".to_string(),
            spec_instructions: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn run_copies_texts_and_links_template() {
        let template = template();
        let player = UserId::new();
        let run = NewAdventure::run_of(&template, player).expect("template is valid");

        assert!(!run.is_template());
        assert_eq!(run.player(), Some(player));
        assert_eq!(run.template_id(), Some(template.id));
        assert_eq!(run.author(), template.author);
        assert_eq!(run.intro, template.intro);
    }

    #[test]
    fn run_of_a_run_is_rejected() {
        let mut not_template = template();
        not_template.is_template = false;
        assert!(NewAdventure::run_of(&not_template, UserId::new()).is_err());
    }

    #[test]
    fn template_requires_title() {
        assert!(NewAdventure::template(UserId::new(), "   ").is_err());
    }

    #[test]
    fn rollback_floor_is_inclusive() {
        let mut adventure = template();
        assert!(adventure.allows_rollback_to(HistoryEntryId::new(1)));

        adventure.rollback_min_history_id = Some(HistoryEntryId::new(10));
        assert!(!adventure.allows_rollback_to(HistoryEntryId::new(9)));
        assert!(adventure.allows_rollback_to(HistoryEntryId::new(10)));
        assert!(adventure.allows_rollback_to(HistoryEntryId::new(11)));
    }

    #[test]
    fn intro_substitutes_hero_name() {
        let adventure = template();
        assert_eq!(
            adventure.render_intro("Mira").as_deref(),
            Some("Mira wakes up in the ash.")
        );
        assert_eq!(render_intro("", "Mira"), None);
    }
}
