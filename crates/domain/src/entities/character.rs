//! Character card - party members, the primary hero and NPCs.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{AdventureId, CharacterId, LocationId, RaceId};

/// Upper bound for every `*_progress` percentage.
pub const MAX_PROGRESS: i64 = 100;

/// Clamps a progress percentage into `0..=100`.
pub fn clamp_progress(value: i64) -> i64 {
    value.clamp(0, MAX_PROGRESS)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub adventure_id: AdventureId,
    pub race_id: Option<RaceId>,
    pub location_id: Option<LocationId>,
    pub is_player: bool,
    pub in_party: bool,
    pub title: String,
    pub description: String,
    pub age: Option<i64>,
    pub body_power: i64,
    pub body_power_progress: i64,
    pub mind_power: i64,
    pub mind_power_progress: i64,
    pub will_power: i64,
    pub will_power_progress: i64,
    pub tags: Vec<String>,
}

impl Character {
    /// A blank non-party character, used as a starting point by importers
    /// and hero creation.
    pub fn blank(adventure_id: AdventureId, title: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(0),
            adventure_id,
            race_id: None,
            location_id: None,
            is_player: false,
            in_party: false,
            title: title.into(),
            description: String::new(),
            age: None,
            body_power: 0,
            body_power_progress: 0,
            mind_power: 0,
            mind_power_progress: 0,
            will_power: 0,
            will_power_progress: 0,
            tags: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if matches!(self.age, Some(age) if age < 0) {
            return Err(DomainError::validation(format!(
                "Character '{}' has a negative age",
                self.title
            )));
        }
        for (name, power) in [
            ("body_power", self.body_power),
            ("mind_power", self.mind_power),
            ("will_power", self.will_power),
        ] {
            if power < 0 {
                return Err(DomainError::validation(format!(
                    "Character '{}' has negative {name}",
                    self.title
                )));
            }
        }
        for (name, progress) in [
            ("body_power_progress", self.body_power_progress),
            ("mind_power_progress", self.mind_power_progress),
            ("will_power_progress", self.will_power_progress),
        ] {
            if !(0..=MAX_PROGRESS).contains(&progress) {
                return Err(DomainError::validation(format!(
                    "Character '{}' has {name} outside 0..=100",
                    self.title
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_progress_bounds() {
        assert_eq!(clamp_progress(150), 100);
        assert_eq!(clamp_progress(-5), 0);
        assert_eq!(clamp_progress(42), 42);
    }

    #[test]
    fn validate_rejects_out_of_range_stats() {
        let mut character = Character::blank(AdventureId::new(1), "Mira");
        assert!(character.validate().is_ok());

        character.mind_power = -1;
        assert!(character.validate().is_err());

        character.mind_power = 3;
        character.will_power_progress = 101;
        assert!(character.validate().is_err());

        character.will_power_progress = 0;
        character.age = Some(-2);
        assert!(character.validate().is_err());
    }
}
