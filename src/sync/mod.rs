//! Synchronisation between the backing source, the store and subscribers
//!
//! `Synchronizer` is the single owner of the reload and update flows:
//!
//! - reloads pull from the `SourceLoader`, swap the `RecordStore` when the
//!   load was fresh, and broadcast the new sizes through the `SyncHub`
//! - updates patch the store first and then, in local-file deployments,
//!   persist the edited cells through the `UpdateWriter`

pub mod fanout;
pub mod watcher;
pub mod writer;

pub use fanout::{SseBody, SyncHub};
pub use watcher::{ChangeWatcher, WatchState, WatchStatus};
pub use writer::UpdateWriter;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::model::{EventPatch, EventRecord, InitiativePatch, InitiativeRecord};
use crate::source::{Backend, LoadKind, SourceLoader};
use crate::store::RecordStore;
use crate::types::Result;

/// Payload of `fileChanged` and `refresh` events
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadSummary {
    pub initiatives_count: usize,
    pub events_count: usize,
    pub timestamp: String,
    #[serde(skip)]
    pub kind: Option<LoadKind>,
}

pub struct Synchronizer {
    store: Arc<RecordStore>,
    loader: Arc<SourceLoader>,
    hub: Arc<SyncHub>,
    writer: Option<UpdateWriter>,
    watch_status: Arc<WatchStatus>,
}

impl Synchronizer {
    /// Wire the pieces for the loader's backend. Write-back is enabled only
    /// for local workbooks.
    pub fn new(store: Arc<RecordStore>, loader: Arc<SourceLoader>, hub: Arc<SyncHub>) -> Self {
        let writer = match loader.backend() {
            Backend::LocalFile(path) => {
                let writer = UpdateWriter::new(path.clone(), loader.decoder().layout.clone());
                if writer.supports_write_back() {
                    Some(writer)
                } else {
                    warn!(
                        path = %path.display(),
                        "Source format cannot be written back; updates stay in memory"
                    );
                    None
                }
            }
            _ => None,
        };

        Self {
            store,
            loader,
            hub,
            writer,
            watch_status: Arc::new(WatchStatus::default()),
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn hub(&self) -> &Arc<SyncHub> {
        &self.hub
    }

    pub fn loader(&self) -> &Arc<SourceLoader> {
        &self.loader
    }

    pub fn watch_status(&self) -> &Arc<WatchStatus> {
        &self.watch_status
    }

    /// Whether this deployment serves live updates (stream, watcher, write-back)
    pub fn is_local(&self) -> bool {
        matches!(self.loader.backend(), Backend::LocalFile(_))
    }

    /// Load from the backend, swap the store on a fresh load and broadcast
    /// the resulting sizes as `event`
    pub async fn reload(&self, event: &str) -> ReloadSummary {
        let outcome = self.loader.load().await;
        if outcome.is_fresh() {
            self.store.replace_all(outcome.envelope).await;
        }

        let snapshot = self.store.snapshot().await;
        let summary = ReloadSummary {
            initiatives_count: snapshot.initiatives.len(),
            events_count: snapshot.events.len(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            kind: Some(outcome.kind),
        };
        self.hub.broadcast(event, &summary);
        summary
    }

    /// Forced reload through the API; bypasses the remote freshness window
    pub async fn refresh(&self) -> ReloadSummary {
        self.loader.invalidate().await;
        self.reload(fanout::EVENT_REFRESH).await
    }

    /// Refetch a remote envelope whose freshness window has passed. Local
    /// deployments are kept current by the watcher instead.
    pub async fn ensure_fresh(&self) {
        if self.loader.is_stale().await {
            let outcome = self.loader.load().await;
            if outcome.is_fresh() {
                self.store.replace_all(outcome.envelope).await;
            }
        }
    }

    /// Start the change watcher for local deployments
    pub fn watch(self: &Arc<Self>, debounce: Duration) -> Result<Option<ChangeWatcher>> {
        let Backend::LocalFile(path) = self.loader.backend() else {
            return Ok(None);
        };

        let sync = Arc::downgrade(self);
        let watcher = ChangeWatcher::spawn(path, debounce, self.watch_status.clone(), move || {
            let sync = sync.clone();
            async move {
                if let Some(sync) = sync.upgrade() {
                    let summary = sync.reload(fanout::EVENT_FILE_CHANGED).await;
                    debug!(
                        initiatives = summary.initiatives_count,
                        events = summary.events_count,
                        "Reloaded after workbook change"
                    );
                }
            }
        })?;
        Ok(Some(watcher))
    }

    /// Patch an initiative and persist its edited cells.
    ///
    /// The in-memory update stands even if write-back fails.
    pub async fn update_initiative(
        &self,
        id: &str,
        patch: &InitiativePatch,
    ) -> Option<InitiativeRecord> {
        let record = self.store.apply_initiative_update(id, patch).await?;
        if let Some(writer) = &self.writer {
            if let Err(e) = writer.persist_initiative(&record).await {
                error!(
                    id = %record.id,
                    row = record.source_row_index,
                    error = %e,
                    "Write-back failed; store and workbook diverge until next reload"
                );
            }
        }
        Some(record)
    }

    pub async fn update_event(&self, id: &str, patch: &EventPatch) -> Option<EventRecord> {
        let record = self.store.apply_event_update(id, patch).await?;
        if let Some(writer) = &self.writer {
            if let Err(e) = writer.persist_event(&record).await {
                error!(
                    id = %record.id,
                    row = record.source_row_index,
                    error = %e,
                    "Write-back failed; store and workbook diverge until next reload"
                );
            }
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::TabularDecoder;
    use crate::model::InitiativeStatus;

    const PAYLOAD: &str = r#"{
        "initiatives": [{"id": "i1", "initiative": "Launch", "status": "In Progress", "rowIndex": 2}],
        "events": [{"id": "e1", "eventName": "Expo", "rowIndex": 2}]
    }"#;

    fn local_sync(dir: &tempfile::TempDir) -> Arc<Synchronizer> {
        let path = dir.path().join("saap.json");
        std::fs::write(&path, PAYLOAD).unwrap();
        let loader = SourceLoader::new(Backend::LocalFile(path), TabularDecoder::default());
        Arc::new(Synchronizer::new(
            Arc::new(RecordStore::new()),
            Arc::new(loader),
            Arc::new(SyncHub::new()),
        ))
    }

    #[tokio::test]
    async fn test_reload_populates_store_and_broadcasts() {
        let dir = tempfile::tempdir().unwrap();
        let sync = local_sync(&dir);
        let _client = sync.hub().subscribe();

        let summary = sync.reload(fanout::EVENT_REFRESH).await;

        assert_eq!(summary.initiatives_count, 1);
        assert_eq!(summary.events_count, 1);
        assert_eq!(summary.kind, Some(LoadKind::Fresh));
        assert_eq!(sync.store().generation().await, 1);
        assert!(sync.is_local());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_generation() {
        let dir = tempfile::tempdir().unwrap();
        let sync = local_sync(&dir);
        sync.reload(fanout::EVENT_REFRESH).await;

        std::fs::write(dir.path().join("saap.json"), "{broken").unwrap();
        let summary = sync.refresh().await;

        assert_eq!(summary.kind, Some(LoadKind::Cached));
        assert_eq!(summary.initiatives_count, 1);
        assert_eq!(sync.store().generation().await, 1);
    }

    #[tokio::test]
    async fn test_update_without_writable_workbook_stays_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let sync = local_sync(&dir);
        sync.reload(fanout::EVENT_REFRESH).await;

        let patch = InitiativePatch::status(InitiativeStatus::AtRisk);
        let updated = sync.update_initiative("i1", &patch).await.unwrap();
        assert_eq!(updated.status, InitiativeStatus::AtRisk);
        assert_eq!(
            sync.store().get_initiative("i1").await.unwrap().status,
            InitiativeStatus::AtRisk
        );

        assert!(sync.update_initiative("nope", &patch).await.is_none());
        assert!(sync.update_event("nope", &EventPatch::default()).await.is_none());
    }
}
