//! REST handlers for the dashboard API
//!
//! Every handler returns a complete `Response<Full<Bytes>>`. Payloads use
//! the `{ success, data }` / `{ success: false, message }` envelope the
//! dashboard expects.

pub mod dashboard;
pub mod events;
pub mod health;
pub mod initiatives;
pub mod sync;

pub use dashboard::dashboard_stats;
pub use events::{get_event, list_events, update_event};
pub use health::health_check;
pub use initiatives::{
    get_initiative, list_initiatives, update_initiative, update_initiative_status,
};
pub use sync::{sync_refresh, sync_status, sync_stream};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::types::SyncError;

/// Serialise `body` as a JSON response
pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .header("Cache-Control", "no-store")
            .body(Full::new(Bytes::from(bytes)))
            .unwrap(),
        Err(e) => {
            warn!(error = %e, "Failed to serialise response");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to serialise response")
        }
    }
}

/// `{ success: true, data }`
pub(crate) fn success<T: Serialize>(data: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &json!({ "success": true, "data": data }))
}

/// `{ success: false, message }`
pub(crate) fn failure(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = json!({ "success": false, "message": message });
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

/// Map an error onto the failure envelope
pub(crate) fn error_response(err: &SyncError) -> Response<Full<Bytes>> {
    let message = match err {
        SyncError::BadRequest(m) | SyncError::NotFound(m) => m.clone(),
        other => other.to_string(),
    };
    failure(err.status_code(), &message)
}

pub(crate) fn not_found(message: &str) -> Response<Full<Bytes>> {
    error_response(&SyncError::NotFound(message.to_string()))
}

/// Parse a query string into a filter; a missing query yields the default
pub(crate) fn parse_query<T: DeserializeOwned + Default>(query: Option<&str>) -> Result<T, SyncError> {
    match query {
        None | Some("") => Ok(T::default()),
        Some(q) => serde_urlencoded::from_str(q)
            .map_err(|e| SyncError::BadRequest(format!("Invalid query: {}", e))),
    }
}

/// Parse a JSON request body
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, SyncError> {
    serde_json::from_slice(body).map_err(|e| SyncError::BadRequest(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use bytes::Bytes;
    use clap::Parser;
    use http_body_util::{BodyExt, Full};
    use hyper::Response;

    use crate::config::Args;
    use crate::decode::TabularDecoder;
    use crate::model::{CacheEnvelope, EventRecord, InitiativeRecord, InitiativeStatus};
    use crate::server::AppState;
    use crate::source::{Backend, SourceLoader};
    use crate::store::RecordStore;
    use crate::sync::{SyncHub, Synchronizer};

    pub fn sample_envelope() -> CacheEnvelope {
        let initiatives = vec![
            InitiativeRecord {
                id: "i1".into(),
                objective: "Grow sales".into(),
                key_result: "Revenue +10%".into(),
                department: "Sales".into(),
                initiative_name: "Launch campaign X".into(),
                start_date: Some("2023-03-15".into()),
                person_in_charge: "Jane".into(),
                accountable: "John".into(),
                status: InitiativeStatus::Completed,
                source_row_index: 2,
                ..Default::default()
            },
            InitiativeRecord {
                id: "i2".into(),
                objective: "Retain talent".into(),
                department: "HR".into(),
                initiative_name: "Mentoring scheme".into(),
                person_in_charge: "Aina".into(),
                status: InitiativeStatus::InProgress,
                source_row_index: 3,
                ..Default::default()
            },
        ];
        let events = vec![EventRecord {
            id: "e1".into(),
            event_name: "Tech Expo".into(),
            category: "Other".into(),
            date_month: "March".into(),
            location: "KL".into(),
            estimated_cost: 2000.0,
            status: "Planned".into(),
            source_row_index: 2,
            ..Default::default()
        }];
        CacheEnvelope::new(initiatives, events)
    }

    /// State over an in-memory store with no backend
    pub async fn state() -> Arc<AppState> {
        let store = Arc::new(RecordStore::new());
        store.replace_all(sample_envelope()).await;
        let loader = Arc::new(SourceLoader::new(Backend::Empty, TabularDecoder::default()));
        let sync = Arc::new(Synchronizer::new(store, loader, Arc::new(SyncHub::new())));
        Arc::new(AppState::new(Args::parse_from(["saap-sync"]), sync))
    }

    pub async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}
