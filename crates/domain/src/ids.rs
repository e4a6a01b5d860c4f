use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Externally issued identifiers (players, authors).
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

/// Store-assigned row identifiers.
///
/// These are allocated by the store in creation order, so comparing two ids of
/// the same type compares their creation order. History windowing and the
/// rollback watermark depend on that.
macro_rules! define_row_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_id!(UserId);

// Adventure and its log
define_row_id!(AdventureId);
define_row_id!(HistoryEntryId);

// World cards
define_row_id!(LocationId);
define_row_id!(RaceId);
define_row_id!(FactionId);
define_row_id!(OtherInfoId);
define_row_id!(EventId);
define_row_id!(CharacterId);
define_row_id!(SkillSystemId);
define_row_id!(TechniqueId);

// Join records
define_row_id!(CharacterSystemId);
define_row_id!(CharacterTechniqueId);
define_row_id!(CharacterFactionId);
define_row_id!(RelationshipId);
