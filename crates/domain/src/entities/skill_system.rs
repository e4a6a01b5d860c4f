//! Skill systems, their techniques, and what each character knows of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{
    AdventureId, CharacterId, CharacterSystemId, CharacterTechniqueId, SkillSystemId, TechniqueId,
};

/// A discipline a character can progress in (magic school, martial art...).
///
/// The weights describe how body/mind/will feed into it; at least one must be
/// non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSystem {
    pub id: SkillSystemId,
    pub adventure_id: AdventureId,
    pub title: String,
    pub description: String,
    pub w_body: i64,
    pub w_mind: i64,
    pub w_will: i64,
    pub formula_hint: String,
    pub tags: Vec<String>,
}

impl SkillSystem {
    pub fn validate(&self) -> Result<(), DomainError> {
        let weights = [self.w_body, self.w_mind, self.w_will];
        if weights.iter().any(|w| *w < 0) {
            return Err(DomainError::validation(format!(
                "Skill system '{}' has a negative weight",
                self.title
            )));
        }
        if weights.iter().all(|w| *w == 0) {
            return Err(DomainError::validation(format!(
                "Skill system '{}' needs at least one non-zero weight",
                self.title
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub id: TechniqueId,
    pub adventure_id: AdventureId,
    pub system_id: SkillSystemId,
    pub title: String,
    pub description: String,
    pub difficulty: i64,
    pub tier: Option<i64>,
    pub required_system_level: i64,
    pub tags: Vec<String>,
}

impl Technique {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.difficulty < 0
            || self.required_system_level < 0
            || matches!(self.tier, Some(tier) if tier < 0)
        {
            return Err(DomainError::validation(format!(
                "Technique '{}' has a negative difficulty, tier or required level",
                self.title
            )));
        }
        Ok(())
    }
}

/// A character's standing in one skill system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSystem {
    pub id: CharacterSystemId,
    pub adventure_id: AdventureId,
    pub character_id: CharacterId,
    pub system_id: SkillSystemId,
    pub level: i64,
    /// Progress towards the next level, `0..=100`.
    pub progress_percent: i64,
    pub notes: String,
}

impl CharacterSystem {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.level < 0 {
            return Err(DomainError::validation("System level cannot be negative"));
        }
        if !(0..=crate::entities::MAX_PROGRESS).contains(&self.progress_percent) {
            return Err(DomainError::validation(
                "System progress must be within 0..=100",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterTechnique {
    pub id: CharacterTechniqueId,
    pub adventure_id: AdventureId,
    pub character_id: CharacterId,
    pub technique_id: TechniqueId,
    pub notes: String,
    pub learned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(w_body: i64, w_mind: i64, w_will: i64) -> SkillSystem {
        SkillSystem {
            id: SkillSystemId::new(1),
            adventure_id: AdventureId::new(1),
            title: "Pyromancy".to_string(),
            description: String::new(),
            w_body,
            w_mind,
            w_will,
            formula_hint: String::new(),
            tags: vec![],
        }
    }

    #[test]
    fn system_weights_cannot_all_be_zero() {
        assert!(system(0, 0, 0).validate().is_err());
        assert!(system(0, 2, 0).validate().is_ok());
        assert!(system(-1, 2, 0).validate().is_err());
    }
}
