//! Offline workbook to JSON envelope conversion
//!
//! Produces the payload the remote deployment serves from its object store.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::decode::{IdentityMode, LayoutPreset, TabularDecoder, WorkbookLayout};
use crate::model::{CacheEnvelope, EnvelopeMetadata};
use crate::types::{Result, SyncError};

/// Decode the workbook at `input` and stamp it with conversion metadata.
///
/// Ids are row-derived so repeated conversions of the same workbook agree.
pub fn convert_workbook(
    input: &Path,
    preset: LayoutPreset,
    revenue_target: f64,
) -> Result<CacheEnvelope> {
    let bytes = std::fs::read(input)
        .map_err(|e| SyncError::Io(format!("failed to read {}: {}", input.display(), e)))?;

    let decoder = TabularDecoder::new(WorkbookLayout::from_preset(preset), IdentityMode::RowDerived);
    let envelope = decoder.decode_workbook(&bytes)?.with_metadata(EnvelopeMetadata {
        last_updated: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        revenue_target,
    });

    info!(
        input = %input.display(),
        initiatives = envelope.initiatives.len(),
        events = envelope.events.len(),
        "Converted workbook"
    );
    Ok(envelope)
}

/// Write `envelope` as pretty-printed JSON
pub fn write_envelope(envelope: &CacheEnvelope, output: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(envelope)?;
    std::fs::write(output, json)
        .map_err(|e| SyncError::Io(format!("failed to write {}: {}", output.display(), e)))
}
