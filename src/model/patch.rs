//! Partial updates accepted by `PUT` endpoints
//!
//! Patches have no `id` or `rowIndex` fields, so an update can never move a
//! record or change its identity. Unknown JSON fields are ignored.

use serde::{Deserialize, Deserializer};

use super::records::{EventRecord, InitiativeRecord};
use super::status::InitiativeStatus;
use super::DEFAULT_EVENT_CATEGORY;

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
fn nullable<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiativePatch {
    pub objective: Option<String>,
    pub key_result: Option<String>,
    pub department: Option<String>,
    #[serde(rename = "initiative", alias = "initiativeName")]
    pub initiative_name: Option<String>,
    pub monthly_objective: Option<String>,
    pub weekly_tasks: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<String>>,
    pub resources_financial: Option<String>,
    pub resources_non_financial: Option<String>,
    pub person_in_charge: Option<String>,
    pub accountable: Option<String>,
    pub status: Option<InitiativeStatus>,
    pub remarks: Option<String>,
}

impl InitiativePatch {
    /// Patch touching only the status
    pub fn status(status: InitiativeStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Merge supplied fields onto `record`
    pub fn apply(&self, record: &mut InitiativeRecord) {
        fn set(slot: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                slot.clone_from(v);
            }
        }

        set(&mut record.objective, &self.objective);
        set(&mut record.key_result, &self.key_result);
        set(&mut record.department, &self.department);
        set(&mut record.initiative_name, &self.initiative_name);
        set(&mut record.monthly_objective, &self.monthly_objective);
        set(&mut record.weekly_tasks, &self.weekly_tasks);
        if let Some(date) = &self.start_date {
            record.start_date.clone_from(date);
        }
        if let Some(date) = &self.end_date {
            record.end_date.clone_from(date);
        }
        set(&mut record.resources_financial, &self.resources_financial);
        set(&mut record.resources_non_financial, &self.resources_non_financial);
        set(&mut record.person_in_charge, &self.person_in_charge);
        set(&mut record.accountable, &self.accountable);
        if let Some(status) = self.status {
            record.status = status;
        }
        set(&mut record.remarks, &self.remarks);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub priority: Option<String>,
    pub event_name: Option<String>,
    pub category: Option<String>,
    pub date_month: Option<String>,
    pub location: Option<String>,
    pub estimated_cost: Option<f64>,
    pub why_attend: Option<String>,
    pub target_companies: Option<String>,
    pub action_required: Option<String>,
    pub status: Option<String>,
}

impl EventPatch {
    pub fn apply(&self, record: &mut EventRecord) {
        fn set(slot: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                slot.clone_from(v);
            }
        }

        set(&mut record.priority, &self.priority);
        set(&mut record.event_name, &self.event_name);
        if let Some(category) = &self.category {
            record.category = if category.trim().is_empty() {
                DEFAULT_EVENT_CATEGORY.to_string()
            } else {
                category.clone()
            };
        }
        set(&mut record.date_month, &self.date_month);
        set(&mut record.location, &self.location);
        if let Some(cost) = self.estimated_cost {
            record.estimated_cost = if cost.is_finite() { cost.max(0.0) } else { 0.0 };
        }
        set(&mut record.why_attend, &self.why_attend);
        set(&mut record.target_companies, &self.target_companies);
        set(&mut record.action_required, &self.action_required);
        set(&mut record.status, &self.status);
    }
}
