//! `GET /api/dashboard/stats`

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;

use super::success;
use crate::server::AppState;
use crate::store::DashboardStats;

pub async fn dashboard_stats(state: &AppState) -> Response<Full<Bytes>> {
    let snapshot = state.snapshot().await;
    success(&DashboardStats::compute(&snapshot, state.args.revenue_target))
}
