//! Sync endpoints
//!
//! - `GET /api/sync/stream` - Server-Sent Events (local-file deployments only)
//! - `POST /api/sync/refresh` - force a reload and broadcast `refresh`
//! - `GET /api/sync/status` - source, last reload and subscriber count

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::info;

use super::success;
use crate::server::AppState;
use crate::sync::{SseBody, WatchState};

/// Open an SSE stream, or `None` when this deployment has no live updates
pub fn sync_stream(state: &AppState) -> Option<Response<SseBody>> {
    if !state.sync.is_local() {
        return None;
    }

    let body = state.sync.hub().subscribe();
    Some(
        Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .header("Connection", "keep-alive")
            .header("Access-Control-Allow-Origin", "*")
            .body(body)
            .unwrap(),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub initiatives_count: usize,
    pub events_count: usize,
    pub last_modified: Option<DateTime<Utc>>,
}

pub async fn sync_refresh(state: &AppState) -> Response<Full<Bytes>> {
    let summary = state.sync.refresh().await;
    info!(
        initiatives = summary.initiatives_count,
        events = summary.events_count,
        "Refresh requested"
    );

    success(&RefreshResponse {
        initiatives_count: summary.initiatives_count,
        events_count: summary.events_count,
        last_modified: state.sync.store().loaded_at().await,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Path or URL of the backing source
    pub excel_path: Option<String>,
    pub source: &'static str,
    pub last_modified: Option<DateTime<Utc>>,
    pub connected_clients: usize,
    pub watcher: WatchState,
    pub generation: u64,
}

pub async fn sync_status(state: &AppState) -> Response<Full<Bytes>> {
    let backend = state.sync.loader().backend();
    let store = state.sync.store();

    success(&SyncStatus {
        excel_path: backend.location(),
        source: backend.kind(),
        last_modified: store.loaded_at().await,
        connected_clients: state.sync.hub().client_count(),
        watcher: state.sync.watch_status().get(),
        generation: store.generation().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{body_json, state};

    #[tokio::test]
    async fn test_stream_unavailable_without_local_workbook() {
        let state = state().await;
        assert!(sync_stream(&state).is_none());
    }

    #[tokio::test]
    async fn test_status() {
        let state = state().await;
        let body = body_json(sync_status(&state).await).await;
        let data = &body["data"];

        assert_eq!(data["source"], "none");
        assert!(data["excelPath"].is_null());
        assert_eq!(data["connectedClients"], 0);
        assert_eq!(data["watcher"], "idle");
        assert_eq!(data["generation"], 1);
        assert!(data["lastModified"].is_string());
    }

    #[tokio::test]
    async fn test_refresh_with_empty_backend_keeps_store() {
        let state = state().await;
        let body = body_json(sync_refresh(&state).await).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["initiativesCount"], 2);
        assert_eq!(body["data"]["eventsCount"], 1);
    }
}
