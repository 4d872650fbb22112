//! Update Writer - persists edited fields back into the workbook
//!
//! Only the fields users edit from the dashboard are written: status and
//! remarks for initiatives, status for events. Every write re-reads the
//! workbook so edits made in the spreadsheet since the last reload survive.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::decode::{SheetLayout, WorkbookLayout};
use crate::model::{EventRecord, InitiativeRecord};
use crate::types::{Result, SyncError};

/// One cell to overwrite: 0-based column, 1-based row
#[derive(Debug, Clone, PartialEq)]
struct CellWrite {
    column: usize,
    row: u32,
    value: String,
}

pub struct UpdateWriter {
    path: PathBuf,
    layout: WorkbookLayout,
    /// Serialises read-modify-write cycles issued by this process
    lock: Mutex<()>,
}

impl UpdateWriter {
    pub fn new(path: impl Into<PathBuf>, layout: WorkbookLayout) -> Self {
        Self {
            path: path.into(),
            layout,
            lock: Mutex::new(()),
        }
    }

    /// Whether the backing file is a format that can be written in place
    pub fn supports_write_back(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
    }

    pub async fn persist_initiative(&self, record: &InitiativeRecord) -> Result<()> {
        let columns = &self.layout.initiatives.columns;
        let writes = vec![
            CellWrite {
                column: columns.status,
                row: record.source_row_index,
                value: record.status.label().to_string(),
            },
            CellWrite {
                column: columns.remarks,
                row: record.source_row_index,
                value: record.remarks.clone(),
            },
        ];
        self.write(self.layout.initiatives.clone(), writes, &record.id).await
    }

    pub async fn persist_event(&self, record: &EventRecord) -> Result<()> {
        let writes = vec![CellWrite {
            column: self.layout.events.columns.status,
            row: record.source_row_index,
            value: record.status.clone(),
        }];
        self.write(self.layout.events.clone(), writes, &record.id).await
    }

    async fn write<C: Send + 'static>(
        &self,
        sheet: SheetLayout<C>,
        writes: Vec<CellWrite>,
        record_id: &str,
    ) -> Result<()> {
        if !self.supports_write_back() {
            return Err(SyncError::Workbook(format!(
                "write-back is only supported for .xlsx files, not {}",
                self.path.display()
            )));
        }
        if writes.iter().any(|w| w.row == 0) {
            return Err(SyncError::BadRequest(format!(
                "record {} has no source row",
                record_id
            )));
        }

        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let count = writes.len();
        tokio::task::spawn_blocking(move || write_cells(&path, &sheet, &writes)).await??;

        info!(
            path = %self.path.display(),
            record_id = %record_id,
            cells = count,
            "Wrote update back to workbook"
        );
        Ok(())
    }
}

fn write_cells<C>(path: &Path, sheet: &SheetLayout<C>, writes: &[CellWrite]) -> Result<()> {
    let mut book = umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|e| SyncError::Workbook(format!("failed to read {}: {}", path.display(), e)))?;

    let names: Vec<String> = book
        .get_sheet_collection()
        .iter()
        .map(|ws| ws.get_name().to_string())
        .collect();
    let index = sheet.resolve_index(&names).ok_or_else(|| {
        SyncError::Workbook(format!("no sheet matching {:?} in {}", sheet.names, path.display()))
    })?;

    let worksheet = book
        .get_sheet_mut(&index)
        .ok_or_else(|| SyncError::Workbook(format!("sheet {} disappeared", index)))?;
    for w in writes {
        let column = (w.column + 1) as u32;
        debug!(sheet = %names[index], column, row = w.row, "Writing cell");
        worksheet.get_cell_mut((column, w.row)).set_value(w.value.clone());
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| SyncError::Workbook(format!("failed to write {}: {}", path.display(), e)))
}
