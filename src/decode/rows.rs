//! Row-level decoding for both sheet types
//!
//! Rows are absolute: `rows[0]` is the first row of the sheet, so the
//! 1-based row index of a record is its position plus one.

use super::cell::{self, CellValue, CurrencyFormat};
use super::identity::IdentityMode;
use super::layout::{EventColumns, InitiativeColumns, SheetLayout};
use crate::model::{EventRecord, InitiativeRecord, RecordKind, DEFAULT_EVENT_CATEGORY};

const EMPTY: CellValue = CellValue::Empty;

fn at(row: &[CellValue], col: usize) -> &CellValue {
    row.get(col).unwrap_or(&EMPTY)
}

/// Data rows after the header, paired with their 1-based sheet row
fn data_rows<'a, C>(
    rows: &'a [Vec<CellValue>],
    layout: &'a SheetLayout<C>,
    name_col: usize,
) -> impl Iterator<Item = (u32, &'a [CellValue])> + 'a {
    rows.iter()
        .enumerate()
        .skip(layout.header_rows)
        .filter(move |(_, row)| !at(row, name_col).is_blank())
        .map(|(i, row)| ((i + 1) as u32, row.as_slice()))
}

pub fn decode_initiatives(
    rows: &[Vec<CellValue>],
    layout: &SheetLayout<InitiativeColumns>,
    identity: IdentityMode,
) -> Vec<InitiativeRecord> {
    let c = &layout.columns;
    data_rows(rows, layout, c.initiative)
        .map(|(row_index, row)| InitiativeRecord {
            id: identity.assign(RecordKind::Initiative, row_index),
            objective: cell::to_text(at(row, c.objective)),
            key_result: cell::to_text(at(row, c.key_result)),
            department: cell::to_text(at(row, c.department)),
            initiative_name: cell::to_text(at(row, c.initiative)),
            monthly_objective: cell::to_text(at(row, c.monthly_objective)),
            weekly_tasks: cell::to_text(at(row, c.weekly_tasks)),
            start_date: cell::to_date(at(row, c.start_date)),
            end_date: cell::to_date(at(row, c.end_date)),
            resources_financial: cell::to_text(at(row, c.resources_financial)),
            resources_non_financial: cell::to_text(at(row, c.resources_non_financial)),
            person_in_charge: cell::to_text(at(row, c.person_in_charge)),
            accountable: cell::to_text(at(row, c.accountable)),
            status: cell::to_status(at(row, c.status)),
            remarks: cell::to_text(at(row, c.remarks)),
            source_row_index: row_index,
        })
        .collect()
}

pub fn decode_events(
    rows: &[Vec<CellValue>],
    layout: &SheetLayout<EventColumns>,
    currency: &CurrencyFormat,
    identity: IdentityMode,
) -> Vec<EventRecord> {
    let c = &layout.columns;
    data_rows(rows, layout, c.event_name)
        .map(|(row_index, row)| {
            let category = at(row, c.category);
            EventRecord {
                id: identity.assign(RecordKind::Event, row_index),
                priority: c
                    .priority
                    .map(|col| cell::to_text(at(row, col)))
                    .unwrap_or_default(),
                event_name: cell::to_text(at(row, c.event_name)),
                category: if category.is_blank() {
                    DEFAULT_EVENT_CATEGORY.to_string()
                } else {
                    cell::to_text(category)
                },
                date_month: cell::to_text(at(row, c.date_month)),
                location: cell::to_text(at(row, c.location)),
                estimated_cost: cell::to_cost(at(row, c.estimated_cost), currency),
                why_attend: cell::to_text(at(row, c.why_attend)),
                target_companies: cell::to_text(at(row, c.target_companies)),
                action_required: cell::to_text(at(row, c.action_required)),
                status: cell::to_text(at(row, c.status)),
                source_row_index: row_index,
            }
        })
        .collect()
}
