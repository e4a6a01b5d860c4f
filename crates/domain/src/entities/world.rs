//! World cards without numeric progression: locations, races, factions and
//! free-form lore entries.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{AdventureId, FactionId, LocationId, OtherInfoId, RaceId};

/// A rectangular area on the adventure map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub adventure_id: AdventureId,
    pub title: String,
    pub description: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub tags: Vec<String>,
}

impl Location {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(DomainError::validation(format!(
                "Location '{}' must have positive width and height",
                self.title
            )));
        }
        Ok(())
    }
}

pub const DEFAULT_LIFE_SPAN: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    pub adventure_id: AdventureId,
    pub title: String,
    pub description: String,
    pub life_span: i64,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub adventure_id: AdventureId,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Free-form lore that doesn't fit another card type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherInfo {
    pub id: OtherInfoId,
    pub adventure_id: AdventureId,
    pub category: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_needs_positive_area() {
        let mut location = Location {
            id: LocationId::new(1),
            adventure_id: AdventureId::new(1),
            title: "Harbor".to_string(),
            description: String::new(),
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            tags: vec![],
        };
        assert!(location.validate().is_ok());

        location.height = 0;
        assert!(location.validate().is_err());
    }
}
