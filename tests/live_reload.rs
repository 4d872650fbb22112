//! Change watcher driving reloads and SSE notifications

use std::sync::Arc;
use std::time::Duration;

use http_body_util::BodyExt;
use saap_sync::decode::TabularDecoder;
use saap_sync::source::{Backend, SourceLoader};
use saap_sync::store::RecordStore;
use saap_sync::sync::{SseBody, SyncHub, Synchronizer, WatchState};

async fn next_frame(body: &mut SseBody) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(10), body.frame())
        .await
        .expect("timed out waiting for an SSE frame")
        .unwrap()
        .unwrap();
    String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_change_reloads_and_notifies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saap-data.json");
    std::fs::write(&path, r#"{"initiatives":[{"initiative":"A"}],"events":[]}"#).unwrap();

    let loader = SourceLoader::new(Backend::LocalFile(path.clone()), TabularDecoder::default());
    let sync = Arc::new(Synchronizer::new(
        Arc::new(RecordStore::new()),
        Arc::new(loader),
        Arc::new(SyncHub::new()),
    ));
    sync.reload("refresh").await;

    let watcher = sync.watch(Duration::from_millis(200)).unwrap().unwrap();
    assert_eq!(watcher.state(), WatchState::Watching);

    let mut stream = sync.hub().subscribe();
    assert!(next_frame(&mut stream).await.starts_with("event: connected\n"));

    // Unrelated files in the same directory are ignored
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    std::fs::write(
        &path,
        r#"{"initiatives":[{"initiative":"A"},{"initiative":"B"}],"events":[{"eventName":"Expo"}]}"#,
    )
    .unwrap();

    let frame = next_frame(&mut stream).await;
    assert!(frame.starts_with("event: fileChanged\n"), "{frame}");
    assert!(frame.contains("\"initiativesCount\":2"));
    assert!(frame.contains("\"eventsCount\":1"));
    assert_eq!(sync.store().snapshot().await.initiatives.len(), 2);

    drop(watcher);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_burst_of_writes_reloads_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saap-data.json");
    std::fs::write(&path, r#"{"initiatives":[],"events":[]}"#).unwrap();

    let loader = SourceLoader::new(Backend::LocalFile(path.clone()), TabularDecoder::default());
    let sync = Arc::new(Synchronizer::new(
        Arc::new(RecordStore::new()),
        Arc::new(loader),
        Arc::new(SyncHub::new()),
    ));
    sync.reload("refresh").await;
    let before = sync.store().generation().await;

    let _watcher = sync.watch(Duration::from_millis(400)).unwrap().unwrap();
    let mut stream = sync.hub().subscribe();
    assert!(next_frame(&mut stream).await.starts_with("event: connected\n"));

    // Five saves inside 100ms, well within one quiet period
    for n in 1..=5 {
        let initiatives = vec![r#"{"initiative":"A"}"#; n].join(",");
        std::fs::write(&path, format!(r#"{{"initiatives":[{initiatives}],"events":[]}}"#)).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let frame = next_frame(&mut stream).await;
    assert!(frame.starts_with("event: fileChanged\n"), "{frame}");
    assert!(frame.contains("\"initiativesCount\":5"), "{frame}");

    let extra = tokio::time::timeout(Duration::from_millis(1500), stream.frame()).await;
    assert!(extra.is_err(), "expected a single fileChanged notification");
    assert_eq!(sync.store().generation().await, before + 1);
}

#[tokio::test]
async fn test_remote_deployment_has_no_watcher() {
    let loader = SourceLoader::new(Backend::Empty, TabularDecoder::default());
    let sync = Arc::new(Synchronizer::new(
        Arc::new(RecordStore::new()),
        Arc::new(loader),
        Arc::new(SyncHub::new()),
    ));
    assert!(sync.watch(Duration::from_millis(200)).unwrap().is_none());
    assert!(!sync.is_local());
}
