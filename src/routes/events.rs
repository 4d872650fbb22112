//! Event endpoints
//!
//! - `GET /api/events` - list with optional filters
//! - `GET /api/events/:id`
//! - `PUT /api/events/:id` - partial update

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use tracing::info;

use super::{error_response, not_found, parse_body, parse_query, success};
use crate::model::EventPatch;
use crate::server::AppState;
use crate::store::EventFilter;

const NOT_FOUND: &str = "Event not found";

pub async fn list_events(state: &AppState, query: Option<&str>) -> Response<Full<Bytes>> {
    let filter: EventFilter = match parse_query(query) {
        Ok(filter) => filter,
        Err(e) => return error_response(&e),
    };

    let snapshot = state.snapshot().await;
    success(&filter.apply(&snapshot.events))
}

pub async fn get_event(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    state.sync.ensure_fresh().await;
    match state.sync.store().get_event(id).await {
        Some(record) => success(&record),
        None => not_found(NOT_FOUND),
    }
}

pub async fn update_event(state: &AppState, id: &str, body: &[u8]) -> Response<Full<Bytes>> {
    let patch: EventPatch = match parse_body(body) {
        Ok(patch) => patch,
        Err(e) => return error_response(&e),
    };

    match state.sync.update_event(id, &patch).await {
        Some(record) => {
            info!(id = %id, "Event updated");
            success(&record)
        }
        None => not_found(NOT_FOUND),
    }
}
