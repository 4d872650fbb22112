//! Tabular decoding: workbook bytes or JSON envelopes into typed records
//!
//! The decoder is pure. It never touches the filesystem or the network;
//! callers hand it bytes and get a `CacheEnvelope` back.

pub mod cell;
pub mod identity;
pub mod json;
pub mod layout;
pub mod rows;

pub use cell::{CellValue, CurrencyFormat};
pub use identity::IdentityMode;
pub use layout::{LayoutPreset, SheetLayout, WorkbookLayout};

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Reader};
use tracing::{debug, warn};

use crate::model::CacheEnvelope;
use crate::types::Result;

/// Decoder configuration shared by every load
#[derive(Debug, Clone, Default)]
pub struct TabularDecoder {
    pub layout: WorkbookLayout,
    pub currency: CurrencyFormat,
    pub identity: IdentityMode,
}

impl TabularDecoder {
    pub fn new(layout: WorkbookLayout, identity: IdentityMode) -> Self {
        Self {
            layout,
            currency: CurrencyFormat::default(),
            identity,
        }
    }

    /// Decode a workbook (xlsx, xls or ods) held in memory.
    ///
    /// A sheet that cannot be located yields an empty collection. Only an
    /// unreadable workbook is an error.
    pub fn decode_workbook(&self, bytes: &[u8]) -> Result<CacheEnvelope> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let names = workbook.sheet_names();

        let initiatives = match self.layout.initiatives.resolve(&names) {
            Some(name) => {
                let width = self.layout.initiatives.columns.width();
                let grid = read_grid(&mut workbook, name, width)?;
                rows::decode_initiatives(&grid, &self.layout.initiatives, self.identity)
            }
            None => {
                warn!(sheets = ?names, "No initiatives sheet found");
                Vec::new()
            }
        };

        let events = match self.layout.events.resolve(&names) {
            Some(name) => {
                let width = self.layout.events.columns.width();
                let grid = read_grid(&mut workbook, name, width)?;
                rows::decode_events(&grid, &self.layout.events, &self.currency, self.identity)
            }
            None => {
                warn!(sheets = ?names, "No events sheet found");
                Vec::new()
            }
        };

        debug!(
            initiatives = initiatives.len(),
            events = events.len(),
            "Decoded workbook"
        );
        Ok(CacheEnvelope::new(initiatives, events))
    }

    /// Decode a pre-converted JSON envelope
    pub fn decode_json(&self, bytes: &[u8]) -> Result<CacheEnvelope> {
        json::decode_envelope(bytes, self.identity)
    }
}

/// Materialise a sheet as absolute rows, starting from the sheet's first row
/// regardless of where its used range begins.
///
/// Rows above the used range are empty; every other row holds exactly
/// `width` cells.
fn read_grid<RS>(
    workbook: &mut calamine::Sheets<RS>,
    name: &str,
    width: usize,
) -> Result<Vec<Vec<CellValue>>>
where
    RS: std::io::Read + std::io::Seek,
{
    let range = workbook.worksheet_range(name)?;
    let Some((start_row, start_col)) = range.start() else {
        return Ok(Vec::new());
    };
    let start_col = start_col as usize;

    let mut grid: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
    grid.extend(range.rows().map(|row| {
        (0..width)
            .map(|col| {
                col.checked_sub(start_col)
                    .and_then(|c| row.get(c))
                    .map(CellValue::from)
                    .unwrap_or_default()
            })
            .collect()
    }));
    Ok(grid)
}
