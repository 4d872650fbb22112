//! Initiative status enumeration and free-text normalisation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of initiative states shown on the kanban board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>")]
pub enum InitiativeStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On Hold")]
    OnHold,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "Completed")]
    Completed,
}

/// Synonyms keyed by their compacted form (lower-case, no whitespace, `_` or `-`)
const SYNONYMS: &[(&str, InitiativeStatus)] = &[
    ("notstarted", InitiativeStatus::NotStarted),
    ("inprogress", InitiativeStatus::InProgress),
    ("onhold", InitiativeStatus::OnHold),
    ("atrisk", InitiativeStatus::AtRisk),
    ("completed", InitiativeStatus::Completed),
    ("done", InitiativeStatus::Completed),
];

impl InitiativeStatus {
    /// All statuses in board order
    pub const ALL: [InitiativeStatus; 5] = [
        Self::NotStarted,
        Self::InProgress,
        Self::OnHold,
        Self::AtRisk,
        Self::Completed,
    ];

    /// Display label, identical to the serialised form
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::OnHold => "On Hold",
            Self::AtRisk => "At Risk",
            Self::Completed => "Completed",
        }
    }

    /// Map free-form text onto a status.
    ///
    /// Total: unknown, empty or garbled input yields `NotStarted`.
    pub fn normalize(raw: &str) -> Self {
        let compact: String = raw
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        SYNONYMS
            .iter()
            .find(|(key, _)| *key == compact)
            .map(|(_, status)| *status)
            .unwrap_or_default()
    }
}

impl From<String> for InitiativeStatus {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl From<Option<String>> for InitiativeStatus {
    fn from(raw: Option<String>) -> Self {
        Self::normalize(raw.as_deref().unwrap_or_default())
    }
}

impl From<&str> for InitiativeStatus {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

impl FromStr for InitiativeStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl fmt::Display for InitiativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
