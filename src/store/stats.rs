//! Dashboard aggregates

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{CacheEnvelope, InitiativeStatus, DEFAULT_EVENT_CATEGORY};

/// Per-status initiative counts; every status is always present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    #[serde(rename = "Not Started")]
    pub not_started: usize,
    #[serde(rename = "In Progress")]
    pub in_progress: usize,
    #[serde(rename = "On Hold")]
    pub on_hold: usize,
    #[serde(rename = "At Risk")]
    pub at_risk: usize,
    #[serde(rename = "Completed")]
    pub completed: usize,
}

impl StatusCounts {
    fn slot(&mut self, status: InitiativeStatus) -> &mut usize {
        match status {
            InitiativeStatus::NotStarted => &mut self.not_started,
            InitiativeStatus::InProgress => &mut self.in_progress,
            InitiativeStatus::OnHold => &mut self.on_hold,
            InitiativeStatus::AtRisk => &mut self.at_risk,
            InitiativeStatus::Completed => &mut self.completed,
        }
    }

    pub fn get(&self, status: InitiativeStatus) -> usize {
        match status {
            InitiativeStatus::NotStarted => self.not_started,
            InitiativeStatus::InProgress => self.in_progress,
            InitiativeStatus::OnHold => self.on_hold,
            InitiativeStatus::AtRisk => self.at_risk,
            InitiativeStatus::Completed => self.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_initiatives: usize,
    pub initiatives_by_status: StatusCounts,
    pub total_events: usize,
    pub events_by_category: BTreeMap<String, usize>,
    pub total_events_cost: f64,
    pub revenue_target: f64,
    /// Share of completed initiatives applied to the revenue target
    pub revenue_progress: f64,
    pub department_workload: BTreeMap<String, usize>,
    /// Distinct persons in charge, in order of first appearance
    pub team_members: Vec<String>,
}

impl DashboardStats {
    /// Aggregate a generation. `default_target` applies when the envelope
    /// carries no usable revenue target of its own.
    pub fn compute(envelope: &CacheEnvelope, default_target: f64) -> Self {
        let mut by_status = StatusCounts::default();
        let mut department_workload = BTreeMap::new();
        let mut team_members: Vec<String> = Vec::new();

        for initiative in &envelope.initiatives {
            *by_status.slot(initiative.status) += 1;

            if !initiative.department.is_empty() {
                *department_workload
                    .entry(initiative.department.clone())
                    .or_insert(0) += 1;
            }

            let person = &initiative.person_in_charge;
            if !person.is_empty() && !team_members.contains(person) {
                team_members.push(person.clone());
            }
        }

        let mut events_by_category = BTreeMap::new();
        let mut total_events_cost = 0.0;
        for event in &envelope.events {
            let category = if event.category.trim().is_empty() {
                DEFAULT_EVENT_CATEGORY
            } else {
                event.category.as_str()
            };
            *events_by_category.entry(category.to_string()).or_insert(0) += 1;
            total_events_cost += event.estimated_cost;
        }

        let revenue_target = envelope.revenue_target().unwrap_or(default_target);
        let total = envelope.initiatives.len();
        let revenue_progress =
            (by_status.completed as f64 / total.max(1) as f64 * revenue_target).round();

        Self {
            total_initiatives: total,
            initiatives_by_status: by_status,
            total_events: envelope.events.len(),
            events_by_category,
            total_events_cost,
            revenue_target,
            revenue_progress,
            department_workload,
            team_members,
        }
    }
}
