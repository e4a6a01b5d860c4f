//! Adventure history - the narrative log of a run.
//!
//! Entries are append-only. Their ids are assigned by the store in creation
//! order and form the total order every windowing decision relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::ids::{AdventureId, HistoryEntryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Ai,
    System,
}

impl HistoryRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for HistoryRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HistoryRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "ai" => Ok(Self::Ai),
            "system" => Ok(Self::System),
            _ => Err(DomainError::parse(format!(
                "Invalid history role '{s}'. Valid roles: user, ai, system"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryEntryId,
    pub adventure_id: AdventureId,
    pub role: HistoryRole,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// `role: content`, the line format used inside prompts.
    pub fn prompt_line(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}

/// A history entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub adventure_id: AdventureId,
    pub role: HistoryRole,
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl NewHistoryEntry {
    pub fn new(adventure_id: AdventureId, role: HistoryRole, content: impl Into<String>) -> Self {
        Self {
            adventure_id,
            role,
            content: content.into(),
            metadata: Map::new(),
        }
    }

    pub fn ai(adventure_id: AdventureId, content: impl Into<String>) -> Self {
        Self::new(adventure_id, HistoryRole::Ai, content)
    }

    pub fn user(adventure_id: AdventureId, content: impl Into<String>) -> Self {
        Self::new(adventure_id, HistoryRole::User, content)
    }

    pub fn system(adventure_id: AdventureId, content: impl Into<String>) -> Self {
        Self::new(adventure_id, HistoryRole::System, content)
    }
}
