//! Character membership in factions and character-to-character ties.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{AdventureId, CharacterFactionId, CharacterId, FactionId, RelationshipId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterFaction {
    pub id: CharacterFactionId,
    pub adventure_id: AdventureId,
    pub character_id: CharacterId,
    pub faction_id: FactionId,
    pub role: String,
    pub notes: String,
}

/// Directed relationship from one character to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRelationship {
    pub id: RelationshipId,
    pub adventure_id: AdventureId,
    pub from_character_id: CharacterId,
    pub to_character_id: CharacterId,
    pub kind: String,
    pub description: String,
}

impl CharacterRelationship {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.from_character_id == self.to_character_id {
            return Err(DomainError::validation(
                "A character cannot have a relationship with itself",
            ));
        }
        Ok(())
    }
}
