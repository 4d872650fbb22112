//! Updates flowing through the store into the workbook on disk

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use http_body_util::BodyExt;
use rust_xlsxwriter::Workbook;
use saap_sync::config::Args;
use saap_sync::decode::TabularDecoder;
use saap_sync::model::{EventPatch, InitiativePatch, InitiativeStatus};
use saap_sync::routes;
use saap_sync::server::AppState;
use saap_sync::source::{Backend, SourceLoader};
use saap_sync::store::RecordStore;
use saap_sync::sync::{SyncHub, Synchronizer};

fn write_fixture(path: &Path) {
    let mut workbook = Workbook::new();

    let initiatives = workbook.add_worksheet();
    initiatives.set_name("Initiatives").unwrap();
    initiatives.write_string(0, 3, "Initiative").unwrap();
    initiatives.write_string(1, 0, "Grow sales").unwrap();
    initiatives.write_string(1, 2, "Sales").unwrap();
    initiatives.write_string(1, 3, "Launch campaign X").unwrap();
    initiatives.write_number(1, 6, 45000.0).unwrap();
    initiatives.write_string(1, 10, "Jane").unwrap();
    initiatives.write_string(1, 12, "In Progress").unwrap();
    initiatives.write_string(2, 3, "Partner outreach").unwrap();
    initiatives.write_string(2, 12, "Completed").unwrap();

    let events = workbook.add_worksheet();
    events.set_name("Events").unwrap();
    events.write_string(0, 0, "Event").unwrap();
    events.write_string(1, 0, "Tech Expo").unwrap();
    events.write_string(1, 4, "RM 12,500").unwrap();
    events.write_string(1, 8, "Planned").unwrap();

    workbook.save(path).unwrap();
}

fn synchronizer(path: &Path) -> Arc<Synchronizer> {
    let loader = SourceLoader::new(Backend::LocalFile(path.to_path_buf()), TabularDecoder::default());
    Arc::new(Synchronizer::new(
        Arc::new(RecordStore::new()),
        Arc::new(loader),
        Arc::new(SyncHub::new()),
    ))
}

fn decode_file(path: &Path) -> saap_sync::model::CacheEnvelope {
    let bytes = std::fs::read(path).unwrap();
    TabularDecoder::default().decode_workbook(&bytes).unwrap()
}

#[tokio::test]
async fn test_initiative_update_is_written_to_its_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("SAAP.xlsx");
    write_fixture(&path);

    let sync = synchronizer(&path);
    sync.reload("refresh").await;
    let target = sync.store().snapshot().await.initiatives[0].clone();

    let patch = InitiativePatch {
        status: Some(InitiativeStatus::AtRisk),
        remarks: Some("Vendor delayed".into()),
        department: Some("Marketing".into()),
        ..Default::default()
    };
    let updated = sync.update_initiative(&target.id, &patch).await.unwrap();
    assert_eq!(updated.department, "Marketing");

    let on_disk = decode_file(&path);
    let row = &on_disk.initiatives[0];
    assert_eq!(row.status, InitiativeStatus::AtRisk);
    assert_eq!(row.remarks, "Vendor delayed");
    // Only status and remarks are persisted
    assert_eq!(row.department, "Sales");
    assert_eq!(row.start_date.as_deref(), Some("2023-03-15"));
    assert_eq!(row.person_in_charge, "Jane");

    // Untouched rows survive the rewrite
    assert_eq!(on_disk.initiatives[1].initiative_name, "Partner outreach");
    assert_eq!(on_disk.initiatives[1].status, InitiativeStatus::Completed);
    assert_eq!(on_disk.events[0].estimated_cost, 12500.0);
}

#[tokio::test]
async fn test_event_status_is_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("SAAP.xlsx");
    write_fixture(&path);

    let sync = synchronizer(&path);
    sync.reload("refresh").await;
    let id = sync.store().snapshot().await.events[0].id.clone();

    let patch = EventPatch {
        status: Some("Registered".into()),
        ..Default::default()
    };
    sync.update_event(&id, &patch).await.unwrap();

    let on_disk = decode_file(&path);
    assert_eq!(on_disk.events[0].status, "Registered");
    assert_eq!(on_disk.events[0].event_name, "Tech Expo");
}

#[tokio::test]
async fn test_reload_after_write_keeps_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("SAAP.xlsx");
    write_fixture(&path);

    let sync = synchronizer(&path);
    sync.reload("refresh").await;
    let id = sync.store().snapshot().await.initiatives[1].id.clone();

    sync.update_initiative(&id, &InitiativePatch::status(InitiativeStatus::OnHold))
        .await
        .unwrap();
    sync.reload("fileChanged").await;

    let record = sync.store().get_initiative(&id).await.unwrap();
    assert_eq!(record.status, InitiativeStatus::OnHold);
    assert_eq!(record.source_row_index, 3);
}

#[tokio::test]
async fn test_failed_write_back_keeps_memory_update() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("SAAP.xlsx");
    write_fixture(&path);

    let sync = synchronizer(&path);
    sync.reload("refresh").await;
    let id = sync.store().snapshot().await.initiatives[0].id.clone();

    std::fs::remove_file(&path).unwrap();
    let updated = sync
        .update_initiative(&id, &InitiativePatch::status(InitiativeStatus::Completed))
        .await
        .unwrap();

    assert_eq!(updated.status, InitiativeStatus::Completed);
    assert_eq!(
        sync.store().get_initiative(&id).await.unwrap().status,
        InitiativeStatus::Completed
    );
}

#[tokio::test]
async fn test_status_put_is_reflected_in_stats() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("SAAP.xlsx");
    write_fixture(&path);

    let sync = synchronizer(&path);
    sync.reload("refresh").await;
    let id = sync.store().snapshot().await.initiatives[0].id.clone();
    let state = AppState::new(Args::parse_from(["saap-sync"]), sync);

    let stats = json(routes::dashboard_stats(&state).await).await;
    assert_eq!(stats["data"]["initiativesByStatus"]["In Progress"], 1);
    assert_eq!(stats["data"]["initiativesByStatus"]["At Risk"], 0);

    let response = routes::update_initiative_status(&state, &id, br#"{"status":"At Risk"}"#).await;
    assert_eq!(response.status(), 200);

    let stats = json(routes::dashboard_stats(&state).await).await;
    assert_eq!(stats["data"]["initiativesByStatus"]["In Progress"], 0);
    assert_eq!(stats["data"]["initiativesByStatus"]["At Risk"], 1);
    assert_eq!(decode_file(&path).initiatives[0].status, InitiativeStatus::AtRisk);
}

async fn json(response: hyper::Response<http_body_util::Full<bytes::Bytes>>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
