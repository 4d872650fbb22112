//! Initiative endpoints
//!
//! - `GET /api/initiatives` - list with optional filters
//! - `GET /api/initiatives/:id`
//! - `PUT /api/initiatives/:id` - partial update
//! - `PUT /api/initiatives/:id/status` - body `{ status }`

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use tracing::info;

use super::{error_response, failure, not_found, parse_body, parse_query, success};
use crate::model::{InitiativePatch, InitiativeStatus};
use crate::server::AppState;
use crate::store::InitiativeFilter;

const NOT_FOUND: &str = "Initiative not found";

pub async fn list_initiatives(state: &AppState, query: Option<&str>) -> Response<Full<Bytes>> {
    let filter: InitiativeFilter = match parse_query(query) {
        Ok(filter) => filter,
        Err(e) => return error_response(&e),
    };

    let snapshot = state.snapshot().await;
    success(&filter.apply(&snapshot.initiatives))
}

pub async fn get_initiative(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    state.sync.ensure_fresh().await;
    match state.sync.store().get_initiative(id).await {
        Some(record) => success(&record),
        None => not_found(NOT_FOUND),
    }
}

pub async fn update_initiative(state: &AppState, id: &str, body: &[u8]) -> Response<Full<Bytes>> {
    let patch: InitiativePatch = match parse_body(body) {
        Ok(patch) => patch,
        Err(e) => return error_response(&e),
    };

    match state.sync.update_initiative(id, &patch).await {
        Some(record) => {
            info!(id = %id, "Initiative updated");
            success(&record)
        }
        None => not_found(NOT_FOUND),
    }
}

#[derive(Debug, Default, Deserialize)]
struct StatusBody {
    #[serde(default)]
    status: Option<String>,
}

pub async fn update_initiative_status(
    state: &AppState,
    id: &str,
    body: &[u8],
) -> Response<Full<Bytes>> {
    let body: StatusBody = if body.is_empty() {
        StatusBody::default()
    } else {
        match parse_body(body) {
            Ok(body) => body,
            Err(e) => return error_response(&e),
        }
    };

    let Some(raw) = body.status.filter(|s| !s.trim().is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, "Status is required");
    };
    let status = InitiativeStatus::normalize(&raw);

    match state
        .sync
        .update_initiative(id, &InitiativePatch::status(status))
        .await
    {
        Some(record) => {
            info!(id = %id, status = %status, "Initiative status updated");
            success(&record)
        }
        None => not_found(NOT_FOUND),
    }
}
