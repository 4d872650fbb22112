//! Fixed column layouts for the two sheets
//!
//! Column positions are 0-based. The same layout drives decoding and
//! write-back, so a record's `rowIndex` plus a column index always names the
//! cell it came from.

/// Column positions in the initiatives sheet
#[derive(Debug, Clone, PartialEq)]
pub struct InitiativeColumns {
    pub objective: usize,
    pub key_result: usize,
    pub department: usize,
    pub initiative: usize,
    pub monthly_objective: usize,
    pub weekly_tasks: usize,
    pub start_date: usize,
    pub end_date: usize,
    pub resources_financial: usize,
    pub resources_non_financial: usize,
    pub person_in_charge: usize,
    pub accountable: usize,
    pub status: usize,
    pub remarks: usize,
}

impl InitiativeColumns {
    /// Columns A..N in sheet order, optionally shifted right by `offset`
    fn sequential(offset: usize) -> Self {
        Self {
            objective: offset,
            key_result: offset + 1,
            department: offset + 2,
            initiative: offset + 3,
            monthly_objective: offset + 4,
            weekly_tasks: offset + 5,
            start_date: offset + 6,
            end_date: offset + 7,
            resources_financial: offset + 8,
            resources_non_financial: offset + 9,
            person_in_charge: offset + 10,
            accountable: offset + 11,
            status: offset + 12,
            remarks: offset + 13,
        }
    }

    /// Number of leading columns the layout reads
    pub fn width(&self) -> usize {
        [
            self.objective,
            self.key_result,
            self.department,
            self.initiative,
            self.monthly_objective,
            self.weekly_tasks,
            self.start_date,
            self.end_date,
            self.resources_financial,
            self.resources_non_financial,
            self.person_in_charge,
            self.accountable,
            self.status,
            self.remarks,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
            + 1
    }
}

/// Column positions in the events sheet
#[derive(Debug, Clone, PartialEq)]
pub struct EventColumns {
    pub priority: Option<usize>,
    pub event_name: usize,
    pub category: usize,
    pub date_month: usize,
    pub location: usize,
    pub estimated_cost: usize,
    pub why_attend: usize,
    pub target_companies: usize,
    pub action_required: usize,
    pub status: usize,
}

impl EventColumns {
    fn sequential(offset: usize) -> Self {
        Self {
            priority: offset.checked_sub(1),
            event_name: offset,
            category: offset + 1,
            date_month: offset + 2,
            location: offset + 3,
            estimated_cost: offset + 4,
            why_attend: offset + 5,
            target_companies: offset + 6,
            action_required: offset + 7,
            status: offset + 8,
        }
    }

    pub fn width(&self) -> usize {
        [
            self.event_name,
            self.category,
            self.date_month,
            self.location,
            self.estimated_cost,
            self.why_attend,
            self.target_companies,
            self.action_required,
            self.status,
        ]
        .into_iter()
        .chain(self.priority)
        .max()
        .unwrap_or_default()
            + 1
    }
}

/// Where a sheet lives in the workbook and how its rows are laid out
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout<C> {
    /// Accepted sheet names, tried in order
    pub names: Vec<String>,
    /// Ordinal used when none of `names` exists
    pub fallback_index: usize,
    /// Rows skipped before data starts
    pub header_rows: usize,
    pub columns: C,
}

impl<C> SheetLayout<C> {
    /// Position of the sheet this layout reads from, by name first and then by ordinal
    pub fn resolve_index<S: AsRef<str>>(&self, available: &[S]) -> Option<usize> {
        let position = |wanted: &str| {
            available
                .iter()
                .position(|name| name.as_ref() == wanted)
        };
        self.names
            .iter()
            .find_map(|wanted| position(wanted.as_str()))
            .or_else(|| (self.fallback_index < available.len()).then_some(self.fallback_index))
    }

    pub fn resolve<'a, S: AsRef<str>>(&self, available: &'a [S]) -> Option<&'a str> {
        self.resolve_index(available).map(|i| available[i].as_ref())
    }
}

/// Layout presets selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LayoutPreset {
    /// Working workbook edited alongside the dashboard
    #[default]
    Dashboard,
    /// Planning export with an id/priority column and banner rows
    PlanningExport,
}

/// Layout of both sheets
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookLayout {
    pub initiatives: SheetLayout<InitiativeColumns>,
    pub events: SheetLayout<EventColumns>,
}

impl WorkbookLayout {
    pub fn from_preset(preset: LayoutPreset) -> Self {
        match preset {
            LayoutPreset::Dashboard => Self::dashboard(),
            LayoutPreset::PlanningExport => Self::planning_export(),
        }
    }

    /// Header in row 1, initiatives in columns A..N, events in A..I
    pub fn dashboard() -> Self {
        Self {
            initiatives: SheetLayout {
                names: vec!["Initiatives".into()],
                fallback_index: 0,
                header_rows: 1,
                columns: InitiativeColumns::sequential(0),
            },
            events: SheetLayout {
                names: vec!["Events".into()],
                fallback_index: 1,
                header_rows: 1,
                columns: EventColumns::sequential(0),
            },
        }
    }

    /// Export workbook: headers on row 7 / row 4, id and priority in column A
    pub fn planning_export() -> Self {
        Self {
            initiatives: SheetLayout {
                names: vec!["SAAP".into(), "Initiatives".into()],
                fallback_index: 0,
                header_rows: 7,
                columns: InitiativeColumns::sequential(1),
            },
            events: SheetLayout {
                names: vec!["Events to Attend".into(), "Events".into()],
                fallback_index: 1,
                header_rows: 4,
                columns: EventColumns::sequential(1),
            },
        }
    }
}

impl Default for WorkbookLayout {
    fn default() -> Self {
        Self::dashboard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_widths() {
        let dashboard = WorkbookLayout::dashboard();
        assert_eq!(dashboard.initiatives.columns.width(), 14);
        assert_eq!(dashboard.events.columns.width(), 9);

        let export = WorkbookLayout::planning_export();
        assert_eq!(export.initiatives.columns.width(), 15);
        assert_eq!(export.events.columns.width(), 10);
    }

    #[test]
    fn test_dashboard_columns() {
        let layout = WorkbookLayout::dashboard();
        assert_eq!(layout.initiatives.columns.initiative, 3);
        assert_eq!(layout.initiatives.columns.status, 12);
        assert_eq!(layout.initiatives.columns.remarks, 13);
        assert_eq!(layout.events.columns.priority, None);
        assert_eq!(layout.events.columns.estimated_cost, 4);
        assert_eq!(layout.events.columns.status, 8);
    }

    #[test]
    fn test_export_columns_shift() {
        let layout = WorkbookLayout::planning_export();
        assert_eq!(layout.initiatives.columns.objective, 1);
        assert_eq!(layout.initiatives.columns.remarks, 14);
        assert_eq!(layout.events.columns.priority, Some(0));
        assert_eq!(layout.events.columns.status, 9);
        assert_eq!(layout.initiatives.header_rows, 7);
        assert_eq!(layout.events.header_rows, 4);
    }

    #[test]
    fn test_resolve_by_name_then_ordinal() {
        let layout = WorkbookLayout::planning_export();
        let sheets = ["Cover", "Events", "SAAP"];
        assert_eq!(layout.initiatives.resolve(&sheets), Some("SAAP"));
        assert_eq!(layout.events.resolve(&sheets), Some("Events"));
        assert_eq!(layout.initiatives.resolve_index(&sheets), Some(2));

        let unnamed = ["Sheet1", "Sheet2"];
        assert_eq!(layout.initiatives.resolve(&unnamed), Some("Sheet1"));
        assert_eq!(layout.events.resolve(&unnamed), Some("Sheet2"));

        let single = ["Sheet1"];
        assert_eq!(layout.events.resolve(&single), None);
    }
}
