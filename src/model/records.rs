//! Initiative and event records plus the cache envelope that carries them

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::status::InitiativeStatus;

/// Which of the two collections a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Initiative,
    Event,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiative => "initiative",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the initiatives sheet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitiativeRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub objective: String,
    #[serde(deserialize_with = "null_as_default")]
    pub key_result: String,
    #[serde(deserialize_with = "null_as_default")]
    pub department: String,
    #[serde(
        rename = "initiative",
        alias = "initiativeName",
        deserialize_with = "null_as_default"
    )]
    pub initiative_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_objective: String,
    #[serde(deserialize_with = "null_as_default")]
    pub weekly_tasks: String,
    /// `YYYY-MM-DD` for serial-dated cells, verbatim text otherwise
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub resources_financial: String,
    #[serde(deserialize_with = "null_as_default")]
    pub resources_non_financial: String,
    #[serde(deserialize_with = "null_as_default")]
    pub person_in_charge: String,
    #[serde(deserialize_with = "null_as_default")]
    pub accountable: String,
    pub status: InitiativeStatus,
    #[serde(deserialize_with = "null_as_default")]
    pub remarks: String,
    /// 1-based row in the backing sheet; 0 when the record did not come from a sheet
    #[serde(
        rename = "rowIndex",
        alias = "sourceRowIndex",
        deserialize_with = "null_as_default"
    )]
    pub source_row_index: u32,
}

/// One row of the events sheet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub priority: String,
    #[serde(deserialize_with = "null_as_default")]
    pub event_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date_month: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub estimated_cost: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub why_attend: String,
    #[serde(deserialize_with = "null_as_default")]
    pub target_companies: String,
    #[serde(deserialize_with = "null_as_default")]
    pub action_required: String,
    /// Free text; event statuses are not normalised
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(
        rename = "rowIndex",
        alias = "sourceRowIndex",
        deserialize_with = "null_as_default"
    )]
    pub source_row_index: u32,
}

/// Optional metadata block carried by JSON payloads
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvelopeMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub last_updated: String,
    #[serde(deserialize_with = "null_as_default")]
    pub revenue_target: f64,
}

/// The unit of atomic replacement: both collections plus metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheEnvelope {
    #[serde(deserialize_with = "null_as_default")]
    pub initiatives: Vec<InitiativeRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub events: Vec<EventRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EnvelopeMetadata>,
}

impl CacheEnvelope {
    pub fn new(initiatives: Vec<InitiativeRecord>, events: Vec<EventRecord>) -> Self {
        Self {
            initiatives,
            events,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: EnvelopeMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.initiatives.is_empty() && self.events.is_empty()
    }

    /// Revenue target from metadata, if the payload carried a usable one
    pub fn revenue_target(&self) -> Option<f64> {
        self.metadata
            .as_ref()
            .map(|m| m.revenue_target)
            .filter(|t| *t > 0.0)
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
