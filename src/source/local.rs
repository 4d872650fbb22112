//! Local workbook backend

use std::path::Path;

use tracing::debug;

use crate::decode::TabularDecoder;
use crate::model::CacheEnvelope;
use crate::types::Result;

/// Read and decode a local file off the async runtime.
///
/// `.json` files are treated as pre-converted envelopes; everything else
/// goes through the workbook decoder.
pub async fn read(path: &Path, decoder: &TabularDecoder) -> Result<CacheEnvelope> {
    let bytes = tokio::fs::read(path).await?;
    debug!(path = %path.display(), size = bytes.len(), "Read local workbook");

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let decoder = decoder.clone();

    tokio::task::spawn_blocking(move || {
        if is_json {
            decoder.decode_json(&bytes)
        } else {
            decoder.decode_workbook(&bytes)
        }
    })
    .await?
}

