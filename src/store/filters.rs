//! Query filters for the list endpoints
//!
//! Filters deserialize straight from the query string. Empty parameters
//! are treated as absent.

use serde::Deserialize;

use crate::model::{EventRecord, InitiativeRecord};

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitiativeFilter {
    /// Case-insensitive substring
    pub department: Option<String>,
    /// Exact status label, e.g. `At Risk`
    pub status: Option<String>,
    pub person_in_charge: Option<String>,
    /// Substring over initiative, objective and key result
    pub search: Option<String>,
    /// Inclusive lower bound on `startDate`
    pub start_date: Option<String>,
    /// Inclusive upper bound on `endDate`
    pub end_date: Option<String>,
}

impl InitiativeFilter {
    pub fn matches(&self, record: &InitiativeRecord) -> bool {
        if let Some(department) = non_empty(&self.department) {
            if !contains_ci(&record.department, department) {
                return false;
            }
        }
        if let Some(status) = non_empty(&self.status) {
            if record.status.label() != status {
                return false;
            }
        }
        if let Some(person) = non_empty(&self.person_in_charge) {
            if !contains_ci(&record.person_in_charge, person) {
                return false;
            }
        }
        if let Some(term) = non_empty(&self.search) {
            let hit = contains_ci(&record.initiative_name, term)
                || contains_ci(&record.objective, term)
                || contains_ci(&record.key_result, term);
            if !hit {
                return false;
            }
        }
        if let Some(from) = non_empty(&self.start_date) {
            match record.start_date.as_deref() {
                Some(start) if start >= from => {}
                _ => return false,
            }
        }
        if let Some(until) = non_empty(&self.end_date) {
            match record.end_date.as_deref() {
                Some(end) if end <= until => {}
                _ => return false,
            }
        }
        true
    }

    pub fn apply<'a>(&self, records: &'a [InitiativeRecord]) -> Vec<&'a InitiativeRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFilter {
    /// Exact, case-insensitive
    pub category: Option<String>,
    /// Substring over `dateMonth`
    pub month: Option<String>,
    /// Substring over event name, location and target companies
    pub search: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, record: &EventRecord) -> bool {
        if let Some(category) = non_empty(&self.category) {
            if !record.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(month) = non_empty(&self.month) {
            if !contains_ci(&record.date_month, month) {
                return false;
            }
        }
        if let Some(term) = non_empty(&self.search) {
            let hit = contains_ci(&record.event_name, term)
                || contains_ci(&record.location, term)
                || contains_ci(&record.target_companies, term);
            if !hit {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, records: &'a [EventRecord]) -> Vec<&'a EventRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}
