//! Pre-converted JSON envelopes

use crate::model::{CacheEnvelope, RecordKind, DEFAULT_EVENT_CATEGORY};
use crate::types::Result;

use super::identity::IdentityMode;

/// Parse a JSON cache envelope and bring it in line with decoded workbooks.
///
/// Missing ids are assigned, blank categories fall back to the default
/// and costs are clamped to non-negative finite values. Statuses are
/// already normalised during deserialisation.
pub fn decode_envelope(bytes: &[u8], identity: IdentityMode) -> Result<CacheEnvelope> {
    let mut envelope: CacheEnvelope = serde_json::from_slice(bytes)?;

    for (i, initiative) in envelope.initiatives.iter_mut().enumerate() {
        if initiative.id.trim().is_empty() {
            let row = fallback_row(initiative.source_row_index, i);
            initiative.id = identity.assign(RecordKind::Initiative, row);
        }
    }

    for (i, event) in envelope.events.iter_mut().enumerate() {
        if event.id.trim().is_empty() {
            let row = fallback_row(event.source_row_index, i);
            event.id = identity.assign(RecordKind::Event, row);
        }
        if event.category.trim().is_empty() {
            event.category = DEFAULT_EVENT_CATEGORY.to_string();
        }
        if !event.estimated_cost.is_finite() || event.estimated_cost < 0.0 {
            event.estimated_cost = 0.0;
        }
    }

    Ok(envelope)
}

/// Records without a row get a synthetic one past any plausible sheet row
fn fallback_row(row_index: u32, position: usize) -> u32 {
    if row_index > 0 {
        row_index
    } else {
        u32::MAX - position as u32
    }
}
