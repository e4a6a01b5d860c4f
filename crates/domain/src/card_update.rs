//! Card updates extracted by the model from recent history.
//!
//! The model is asked for a JSON object with four lists. Its output is not
//! trusted: every field of every entry is decoded on its own, and anything
//! missing or mistyped is dropped without failing the rest of the payload.

use serde_json::{Map, Value};

use crate::entities::{clamp_progress, CharacterSystem, EventStatus};
use crate::ids::{CharacterId, CharacterSystemId, CharacterTechniqueId, EventId};

/// Pulls a JSON object out of free-form model output.
///
/// Accepts bare JSON and JSON wrapped in markdown fences. When the text does
/// not parse, falls back to the span between the first `{` and the last `}`.
/// Any JSON value other than an object is rejected.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let unfenced = trimmed.replace("```json", "").replace("```", "");
    let cleaned = unfenced.trim();

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => return Some(map),
        Ok(_) => return None,
        Err(_) => {}
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&cleaned[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Lenient integer decode: integers, finite floats (truncated), numeric
/// strings and booleans.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn record_id(entry: &Map<String, Value>) -> Option<i64> {
    entry.get("id").and_then(coerce_int).filter(|id| *id > 0)
}

fn int_field(entry: &Map<String, Value>, key: &str) -> Option<i64> {
    entry.get(key).and_then(coerce_int)
}

fn text_field(entry: &Map<String, Value>, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_string)
}

fn entries<'a>(
    payload: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

/// Fields to write on an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub status: Option<EventStatus>,
    pub state: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.state.is_none()
    }
}

/// Fields to write on a character. Progress values are already clamped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterPatch {
    pub description: Option<String>,
    pub body_power: Option<i64>,
    pub mind_power: Option<i64>,
    pub will_power: Option<i64>,
    pub body_power_progress: Option<i64>,
    pub mind_power_progress: Option<i64>,
    pub will_power_progress: Option<i64>,
}

impl CharacterPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterSystemPatch {
    pub level: Option<i64>,
    pub progress_percent: Option<i64>,
    pub notes: Option<String>,
}

impl CharacterSystemPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventUpdate {
    pub id: EventId,
    pub patch: EventPatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterUpdate {
    pub id: CharacterId,
    pub patch: CharacterPatch,
}

/// Proposed skill system change; only becomes a patch against the current
/// record, see [`CharacterSystemUpdate::patch_against`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSystemUpdate {
    pub id: CharacterSystemId,
    pub level: Option<i64>,
    pub progress_percent: Option<i64>,
    pub notes: Option<String>,
}

impl CharacterSystemUpdate {
    /// Levels never go down. Progress may drop only together with a level
    /// up; otherwise it may only grow (by any amount). Fields equal to the
    /// current record are left out of the patch.
    pub fn patch_against(&self, current: &CharacterSystem) -> CharacterSystemPatch {
        let mut patch = CharacterSystemPatch::default();
        let leveled_up = matches!(self.level, Some(level) if level > current.level);

        if leveled_up {
            patch.level = self.level;
        }
        if let Some(progress) = self.progress_percent.map(clamp_progress) {
            if progress != current.progress_percent
                && (leveled_up || progress > current.progress_percent)
            {
                patch.progress_percent = Some(progress);
            }
        }
        patch.notes = self
            .notes
            .as_ref()
            .filter(|notes| **notes != current.notes)
            .cloned();
        patch
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterTechniqueUpdate {
    pub id: CharacterTechniqueId,
    pub notes: Option<String>,
}

/// Decoded card update payload. Entries without a usable id are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardUpdatePayload {
    pub events: Vec<EventUpdate>,
    pub characters: Vec<CharacterUpdate>,
    pub character_systems: Vec<CharacterSystemUpdate>,
    pub character_techniques: Vec<CharacterTechniqueUpdate>,
}

impl CardUpdatePayload {
    pub fn from_json(payload: &Map<String, Value>) -> Self {
        let events = entries(payload, "events")
            .filter_map(|entry| {
                Some(EventUpdate {
                    id: EventId::new(record_id(entry)?),
                    patch: EventPatch {
                        status: entry
                            .get("status")
                            .and_then(Value::as_str)
                            .and_then(|s| s.parse().ok()),
                        state: text_field(entry, "state"),
                    },
                })
            })
            .collect();

        let characters = entries(payload, "characters")
            .filter_map(|entry| {
                let progress = |key: &str| int_field(entry, key).map(clamp_progress);
                Some(CharacterUpdate {
                    id: CharacterId::new(record_id(entry)?),
                    patch: CharacterPatch {
                        description: text_field(entry, "description"),
                        body_power: int_field(entry, "body_power"),
                        mind_power: int_field(entry, "mind_power"),
                        will_power: int_field(entry, "will_power"),
                        body_power_progress: progress("body_power_progress"),
                        mind_power_progress: progress("mind_power_progress"),
                        will_power_progress: progress("will_power_progress"),
                    },
                })
            })
            .collect();

        let character_systems = entries(payload, "character_systems")
            .filter_map(|entry| {
                Some(CharacterSystemUpdate {
                    id: CharacterSystemId::new(record_id(entry)?),
                    level: int_field(entry, "level"),
                    progress_percent: int_field(entry, "progress_percent"),
                    notes: text_field(entry, "notes"),
                })
            })
            .collect();

        let character_techniques = entries(payload, "character_techniques")
            .filter_map(|entry| {
                Some(CharacterTechniqueUpdate {
                    id: CharacterTechniqueId::new(record_id(entry)?),
                    notes: text_field(entry, "notes"),
                })
            })
            .collect();

        Self {
            events,
            characters,
            character_systems,
            character_techniques,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.characters.is_empty()
            && self.character_systems.is_empty()
            && self.character_techniques.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AdventureId, SkillSystemId};
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn system_record(level: i64, progress_percent: i64) -> CharacterSystem {
        CharacterSystem {
            id: CharacterSystemId::new(1),
            adventure_id: AdventureId::new(1),
            character_id: CharacterId::new(1),
            system_id: SkillSystemId::new(1),
            level,
            progress_percent,
            notes: String::new(),
        }
    }

    #[test]
    fn extracts_plain_and_fenced_json() {
        assert!(extract_json_object(r#"{"events": []}"#).is_some());
        assert!(extract_json_object("```json\n{\"events\": []}\n```").is_some());
        assert!(extract_json_object("   ").is_none());
        assert!(extract_json_object("no json here").is_none());
    }

    #[test]
    fn falls_back_to_brace_span() {
        let map = extract_json_object("Sure! Here you go: {\"events\": []} Hope that helps.")
            .expect("embedded object");
        assert!(map.contains_key("events"));
        assert!(extract_json_object("} backwards {").is_none());
    }

    #[test]
    fn rejects_non_object_json() {
        assert!(extract_json_object("[{\"events\": []}]").is_none());
        assert!(extract_json_object("42").is_none());
    }

    #[test]
    fn coerces_loose_integers() {
        assert_eq!(coerce_int(&json!(5)), Some(5));
        assert_eq!(coerce_int(&json!(5.9)), Some(5));
        assert_eq!(coerce_int(&json!(" 12 ")), Some(12));
        assert_eq!(coerce_int(&json!(true)), Some(1));
        assert_eq!(coerce_int(&json!("twelve")), None);
        assert_eq!(coerce_int(&json!(null)), None);
        assert_eq!(coerce_int(&json!([1])), None);
    }

    #[test]
    fn bad_fields_are_skipped_individually() {
        let payload = CardUpdatePayload::from_json(&object(json!({
            "events": [
                {"id": 3, "status": "finished", "state": "The bridge burns"},
                {"id": "4", "status": "resolved", "state": 17},
                {"status": "active"},
                "garbage"
            ],
            "characters": [
                {"id": 9, "body_power": "7", "body_power_progress": 150, "mind_power_progress": -5,
                 "will_power": "lots", "description": null}
            ],
            "unknown": {"ignored": true}
        })));

        assert_eq!(payload.events.len(), 2);
        assert_eq!(payload.events[0].patch.status, None);
        assert_eq!(
            payload.events[0].patch.state.as_deref(),
            Some("The bridge burns")
        );
        assert_eq!(payload.events[1].id, EventId::new(4));
        assert_eq!(payload.events[1].patch.status, Some(EventStatus::Resolved));
        assert_eq!(payload.events[1].patch.state, None);

        let character = &payload.characters[0].patch;
        assert_eq!(character.body_power, Some(7));
        assert_eq!(character.body_power_progress, Some(100));
        assert_eq!(character.mind_power_progress, Some(0));
        assert_eq!(character.will_power, None);
        assert_eq!(character.description, None);
        assert!(payload.character_systems.is_empty());
    }

    #[test]
    fn missing_lists_decode_to_nothing() {
        let payload = CardUpdatePayload::from_json(&object(json!({"events": "none"})));
        assert!(payload.is_empty());
    }

    #[test]
    fn negative_powers_are_not_clamped() {
        let payload = CardUpdatePayload::from_json(&object(json!({
            "characters": [{"id": 1, "will_power": -3}]
        })));
        assert_eq!(payload.characters[0].patch.will_power, Some(-3));
    }

    #[test]
    fn system_progress_never_regresses_without_level_up() {
        let current = system_record(3, 40);
        let update = CharacterSystemUpdate {
            id: current.id,
            level: Some(3),
            progress_percent: Some(30),
            notes: None,
        };
        let patch = update.patch_against(&current);
        assert_eq!(patch.progress_percent, None);
        assert_eq!(patch.level, None);
        assert!(patch.is_empty());
    }

    #[test]
    fn unchanged_fields_are_left_out_of_the_patch() {
        let mut current = system_record(3, 40);
        current.notes = "steady".to_string();
        let update = CharacterSystemUpdate {
            id: current.id,
            level: Some(3),
            progress_percent: Some(40),
            notes: Some("steady".to_string()),
        };
        assert!(update.patch_against(&current).is_empty());

        let update = CharacterSystemUpdate {
            notes: Some("shaken".to_string()),
            ..update
        };
        let patch = update.patch_against(&current);
        assert_eq!(patch.level, None);
        assert_eq!(patch.progress_percent, None);
        assert_eq!(patch.notes.as_deref(), Some("shaken"));
    }

    #[test]
    fn level_up_allows_progress_reset() {
        let current = system_record(3, 40);
        let update = CharacterSystemUpdate {
            id: current.id,
            level: Some(4),
            progress_percent: Some(10),
            notes: Some("Mastered the second circle".to_string()),
        };
        let patch = update.patch_against(&current);
        assert_eq!(patch.level, Some(4));
        assert_eq!(patch.progress_percent, Some(10));
        assert_eq!(patch.notes.as_deref(), Some("Mastered the second circle"));
    }

    #[test]
    fn level_never_decreases_and_progress_may_jump() {
        let current = system_record(3, 40);
        let update = CharacterSystemUpdate {
            id: current.id,
            level: Some(2),
            progress_percent: Some(95),
            notes: None,
        };
        let patch = update.patch_against(&current);
        assert_eq!(patch.level, None);
        assert_eq!(patch.progress_percent, Some(95));
    }

    #[test]
    fn out_of_range_system_progress_is_clamped() {
        let current = system_record(1, 10);
        let update = CharacterSystemUpdate {
            id: current.id,
            level: None,
            progress_percent: Some(250),
            notes: None,
        };
        assert_eq!(update.patch_against(&current).progress_percent, Some(100));
    }
}
