//! Change Watcher
//!
//! Watches the workbook's directory (editors and spreadsheet apps usually
//! replace the file rather than write it in place), waits for the file to
//! go quiet, then hands off to a reload callback.
//!
//! ```text
//! Idle → Watching → (quiet change) → Reloading → Watching
//! ```

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, FileIdMap};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::types::{Result, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WatchState {
    Idle = 0,
    Watching = 1,
    Reloading = 2,
}

/// Shared, lock-free view of the watcher state
#[derive(Debug, Default)]
pub struct WatchStatus(AtomicU8);

impl WatchStatus {
    pub fn get(&self) -> WatchState {
        match self.0.load(Ordering::Acquire) {
            1 => WatchState::Watching,
            2 => WatchState::Reloading,
            _ => WatchState::Idle,
        }
    }

    pub fn set(&self, state: WatchState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Running watcher. Dropping it stops both the filesystem watch and the
/// reload task.
pub struct ChangeWatcher {
    path: PathBuf,
    _debouncer: Debouncer<RecommendedWatcher, FileIdMap>,
    task: JoinHandle<()>,
    status: Arc<WatchStatus>,
}

impl ChangeWatcher {
    /// Start watching `path`, calling `on_change` after each quiet period.
    ///
    /// Changes that arrive while a reload is running coalesce into one
    /// follow-up reload.
    pub fn spawn<F, Fut>(
        path: &Path,
        debounce: Duration,
        status: Arc<WatchStatus>,
        on_change: F,
    ) -> Result<Self>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| SyncError::Config(format!("{} is not a file path", path.display())))?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        // Capacity 1: a pending signal already covers any further changes
        let (tx, mut rx) = mpsc::channel::<()>(1);

        let watched = file_name.clone();
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    if events.iter().any(|e| touches_file(&e.event, &watched)) {
                        let _ = tx.try_send(());
                    }
                }
                Err(errors) => {
                    for error in errors {
                        error!(error = ?error, "Filesystem watcher error");
                    }
                }
            }
        })?;

        debouncer.watcher().watch(&dir, RecursiveMode::NonRecursive)?;

        let task_status = status.clone();
        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                task_status.set(WatchState::Reloading);
                on_change().await;
                task_status.set(WatchState::Watching);
            }
            task_status.set(WatchState::Idle);
        });

        status.set(WatchState::Watching);
        info!(path = %path.display(), debounce_ms = debounce.as_millis() as u64, "Watching workbook");

        Ok(Self {
            path,
            _debouncer: debouncer,
            task,
            status,
        })
    }

    pub fn state(&self) -> WatchState {
        self.status.get()
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.task.abort();
        self.status.set(WatchState::Idle);
        debug!(path = %self.path.display(), "Stopped watching workbook");
    }
}

/// Whether `event` changed the file named `file_name`
fn touches_file(event: &Event, file_name: &OsString) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|n| n == file_name.as_os_str()))
}
