//! Adventure events - plot threads the narrator keeps track of.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{AdventureId, EventId, LocationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Inactive,
    Active,
    Resolved,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventStatus {
    type Err = DomainError;

    /// Exact match only; model output with other spellings is not a status.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(Self::Inactive),
            "active" => Ok(Self::Active),
            "resolved" => Ok(Self::Resolved),
            _ => Err(DomainError::parse(format!(
                "Invalid event status '{s}'. Valid statuses: inactive, active, resolved"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdventureEvent {
    pub id: EventId,
    pub adventure_id: AdventureId,
    pub location_id: Option<LocationId>,
    pub status: EventStatus,
    pub title: String,
    pub trigger_hint: String,
    /// Narrative summary of where the event currently stands.
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_exact() {
        assert_eq!("active".parse::<EventStatus>(), Ok(EventStatus::Active));
        assert!("Active".parse::<EventStatus>().is_err());
        assert!("done".parse::<EventStatus>().is_err());
    }
}
