use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

pub const DEFAULT_ACTION: &str = "export";

/// The four opaque content fields of a trip. Their internals are never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripContent {
    #[serde(default = "empty_sequence", deserialize_with = "sequence_or_empty")]
    pub dates: Value,
    #[serde(default = "empty_mapping", deserialize_with = "mapping_or_empty")]
    pub activities: Value,
    #[serde(default = "empty_mapping", deserialize_with = "mapping_or_empty")]
    pub expenses: Value,
    #[serde(default = "empty_sequence", deserialize_with = "sequence_or_empty")]
    pub members: Value,
}

impl Default for TripContent {
    fn default() -> Self {
        Self {
            dates: empty_sequence(),
            activities: empty_mapping(),
            expenses: empty_mapping(),
            members: empty_sequence(),
        }
    }
}

impl TripContent {
    /// Serialises each field into its own column, in table order.
    pub fn to_columns(&self) -> Result<StoredColumns, AppError> {
        Ok(StoredColumns {
            dates: serde_json::to_string(&self.dates)?,
            activities: serde_json::to_string(&self.activities)?,
            expenses: serde_json::to_string(&self.expenses)?,
            members: serde_json::to_string(&self.members)?,
        })
    }

    /// Rebuilds the content from stored columns. Missing or empty cells fall back to
    /// the empty container; anything else must parse.
    pub fn from_columns(
        trip_id: &str,
        dates: Option<&str>,
        activities: Option<&str>,
        expenses: Option<&str>,
        members: Option<&str>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            dates: decode_column(trip_id, "dates", dates, empty_sequence)?,
            activities: decode_column(trip_id, "activities", activities, empty_mapping)?,
            expenses: decode_column(trip_id, "expenses", expenses, empty_mapping)?,
            members: decode_column(trip_id, "members", members, empty_sequence)?,
        })
    }

    /// The bundle written into the `data` column of a history row.
    pub fn to_history_data(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredColumns {
    pub dates: String,
    pub activities: String,
    pub expenses: String,
    pub members: String,
}

/// Current state of one trip, as held in the `latest` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub trip_id: String,
    #[serde(flatten)]
    pub content: TripContent,
    pub updated_at: String,
}

/// One immutable row of the `history` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: String,
    pub trip_id: String,
    #[serde(rename = "type")]
    pub action: String,
    pub data: TripContent,
}

pub fn action_or_default(action: Option<&str>) -> &str {
    match action {
        Some(label) if !label.is_empty() => label,
        _ => DEFAULT_ACTION,
    }
}

fn decode_column(
    trip_id: &str,
    column: &'static str,
    raw: Option<&str>,
    default: fn() -> Value,
) -> Result<Value, AppError> {
    match raw {
        None | Some("") => Ok(default()),
        Some(text) => serde_json::from_str(text).map_err(|source| AppError::MalformedRecord {
            column,
            trip_id: trip_id.to_string(),
            source,
        }),
    }
}

fn empty_sequence() -> Value {
    Value::Array(Vec::new())
}

fn empty_mapping() -> Value {
    Value::Object(Map::new())
}

fn sequence_or_empty<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.unwrap_or_else(empty_sequence))
}

fn mapping_or_empty<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.unwrap_or_else(empty_mapping))
}
