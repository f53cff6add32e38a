// ============================================================================
// clipmine-core/src/metadata/mod.rs
// ============================================================================
//
// METADATA: Part Records, Appearance Events and Merged Timelines
//
// This module defines the persisted data model shared by every stage of the
// pipeline. One Part Metadata Record exists per split part; the updater
// replaces its appearances after analysis and the merger concatenates all of
// a video's records into a Merged Timeline.
//
// ON-DISK FORMAT:
// A record is a JSON object with a `<Part<N>_<base>>_time` key holding the
// part duration as a decimal string and an `Appearances` array. Any other keys
// found in an existing record are carried through rewrites unchanged, and all
// keys keep their order.
//
// KEY COMPONENTS:
// - AppearanceEvent: One timestamped annotation owned by a part
// - RawAppearance: Extractor output before normalization
// - PartRecord: In-memory form of a Part Metadata Record
// - MergedTimeline: Aggregate of all records of one source video
//
// AI-ASSISTANT-INFO: Persisted metadata model, record (de)serialization

// ---- Submodules ----
pub mod merge;
pub mod update;

// ---- Re-exports ----
pub use merge::{merge_and_write, merge_part_files, write_merged_timeline};
pub use update::{normalize_appearances, renumber};

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::naming::PartId;

// ---- External crate imports ----
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the appearance list in records and merged timelines.
pub const APPEARANCES_KEY: &str = "Appearances";

// ============================================================================
// APPEARANCE EVENTS
// ============================================================================

/// One time-stamped annotation within a part's footage.
///
/// Serialized with the keys `part`, `clip`, `start`, `end`, `description` in
/// that order. `clip` is written as `clip_<i>`; plain integers are accepted
/// when reading older records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppearanceEvent {
    /// Owning part label, e.g. `Part3`
    #[serde(rename = "part")]
    pub part_id: String,

    /// 1-based position within the owning part
    #[serde(
        rename = "clip",
        serialize_with = "serialize_clip_index",
        deserialize_with = "deserialize_clip_index"
    )]
    pub clip_index: u32,

    /// Start offset within the part (`M:S`)
    pub start: String,

    /// End offset within the part (`M:S`)
    pub end: String,

    #[serde(default)]
    pub description: String,
}

impl AppearanceEvent {
    /// Reads an event from JSON that may not follow the event shape exactly.
    ///
    /// `start` and `end` must be strings. A missing `part` falls back to
    /// `default_part` and an unreadable `clip` to `position`. Returns `None`
    /// when the event cannot be placed.
    pub fn from_loose_value(value: &Value, default_part: Option<&str>, position: u32) -> Option<Self> {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        let part_id = text("part").or_else(|| default_part.map(str::to_string))?;
        Some(Self {
            part_id,
            clip_index: value.get("clip").and_then(parse_clip_value).unwrap_or(position),
            start: text("start")?,
            end: text("end")?,
            description: text("description").unwrap_or_default(),
        })
    }
}

/// An appearance as recovered from model output, before it is bound to a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAppearance {
    /// Clip identifier proposed by the model; ignored by the updater
    pub clip: Option<String>,
    pub start: String,
    pub end: String,
    pub description: String,
}

fn serialize_clip_index<S>(index: &u32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("clip_{index}"))
}

fn deserialize_clip_index<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_clip_value(&value)
        .ok_or_else(|| de::Error::custom(format!("invalid clip identifier: {value}")))
}

/// Accepts `clip_3`, `"3"` or `3`.
pub(crate) fn parse_clip_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.strip_prefix("clip_").unwrap_or(s).trim().parse().ok(),
        _ => None,
    }
}

// ============================================================================
// PART RECORDS
// ============================================================================

/// In-memory form of a Part Metadata Record.
#[derive(Debug, Clone, PartialEq)]
pub struct PartRecord {
    pub part: PartId,
    /// Probed duration; `0` means unknown
    pub duration_seconds: u64,
    pub appearances: Vec<AppearanceEvent>,
    /// Top-level keys this crate does not manage
    pub extra: Map<String, Value>,
    /// Top-level keys in the order they were read
    key_order: Vec<String>,
}

impl PartRecord {
    /// Creates an empty record, as written right after segmentation.
    pub fn new(part: PartId, duration_seconds: u64) -> Self {
        Self {
            part,
            duration_seconds,
            appearances: Vec::new(),
            extra: Map::new(),
            key_order: Vec::new(),
        }
    }

    /// Key under which the duration is stored, e.g. `Part1_MyVideo_time`.
    pub fn duration_key(&self) -> String {
        duration_key_for(&self.part.to_string())
    }

    /// Serializes the record into its on-disk JSON shape.
    ///
    /// Keys read from an existing record keep their positions. Keys the record
    /// did not have yet follow: duration, then appearances, then extras.
    pub fn to_json(&self) -> CoreResult<Value> {
        let duration_key = self.duration_key();
        let duration = Value::String(self.duration_seconds.to_string());
        let appearances = serde_json::to_value(&self.appearances)?;

        let mut map = Map::new();
        for key in &self.key_order {
            if *key == duration_key {
                map.insert(key.clone(), duration.clone());
            } else if key == APPEARANCES_KEY {
                map.insert(key.clone(), appearances.clone());
            } else if let Some(value) = self.extra.get(key) {
                map.insert(key.clone(), value.clone());
            }
        }

        if !map.contains_key(&duration_key) {
            map.insert(duration_key, duration);
        }
        if !map.contains_key(APPEARANCES_KEY) {
            map.insert(APPEARANCES_KEY.to_string(), appearances);
        }
        for (key, value) in &self.extra {
            if !map.contains_key(key) {
                map.insert(key.clone(), value.clone());
            }
        }
        Ok(Value::Object(map))
    }

    /// Parses a record for `part` from its JSON document.
    ///
    /// A missing duration key reads as `0` and a missing appearance list reads
    /// as empty. Events are read with [`AppearanceEvent::from_loose_value`];
    /// an event missing its part belongs to this record's part, and events
    /// without usable timestamps are dropped with a warning.
    pub fn from_json(part: PartId, value: Value) -> CoreResult<Self> {
        let Value::Object(map) = value else {
            return Err(CoreError::InvalidInput(format!(
                "metadata record for {} is not a JSON object",
                part
            )));
        };

        let key = duration_key_for(&part.to_string());
        let label = part.label();
        let mut duration_seconds = 0;
        let mut appearances = Vec::new();
        let mut extra = Map::new();
        let mut key_order = Vec::with_capacity(map.len());

        for (name, value) in map {
            key_order.push(name.clone());
            if name == key {
                duration_seconds = duration_from_value(&value);
            } else if name == APPEARANCES_KEY {
                appearances = read_events(&part, &label, value);
            } else {
                extra.insert(name, value);
            }
        }

        Ok(Self {
            part,
            duration_seconds,
            appearances,
            extra,
            key_order,
        })
    }
}

fn read_events(part: &PartId, label: &str, value: Value) -> Vec<AppearanceEvent> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        _ => {
            log::warn!("{} of {} is not a list, ignoring it", APPEARANCES_KEY, part);
            return Vec::new();
        }
    };

    items
        .iter()
        .zip(1u32..)
        .filter_map(|(item, position)| {
            let event = AppearanceEvent::from_loose_value(item, Some(label), position);
            if event.is_none() {
                log::warn!(
                    "Ignoring appearance {} of {}: no start or end timestamp",
                    position,
                    part
                );
            }
            event
        })
        .collect()
}

/// Duration key for a record stem.
pub fn duration_key_for(stem: &str) -> String {
    format!("{stem}_time")
}

/// Reads a duration stored either as a decimal string or a number.
///
/// Fractional values are truncated; anything unreadable is `0`.
pub(crate) fn duration_from_value(value: &Value) -> u64 {
    let seconds = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match seconds {
        Some(s) if s.is_finite() && s > 0.0 => s as u64,
        _ => 0,
    }
}

// ============================================================================
// MERGED TIMELINE
// ============================================================================

/// Duration entry of one part inside a merged timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartDuration {
    /// Record stem, e.g. `Part2_MyVideo`
    pub part: String,
    pub time: u64,
}

/// Aggregate of all Part Metadata Records for one source video.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergedTimeline {
    #[serde(rename = "total_time")]
    pub total_duration_seconds: u64,

    #[serde(rename = "part_times")]
    pub part_durations: Vec<PartDuration>,

    /// Events exactly as found in the part records, in part order
    #[serde(rename = "Appearances")]
    pub appearances: Vec<Value>,
}
