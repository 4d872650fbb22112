//! Source Loader
//!
//! Produces cache envelopes from exactly one backend per deployment. Loads
//! never fail: a failed read degrades to the last good envelope, or to an
//! empty one when nothing has loaded yet.

pub mod local;
pub mod remote;

pub use remote::{HttpFetcher, ObjectFetcher};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::decode::TabularDecoder;
use crate::model::CacheEnvelope;
use crate::types::Result;

/// Where envelopes come from
#[derive(Clone)]
pub enum Backend {
    /// Workbook (or JSON envelope) on local disk; re-read on every load
    LocalFile(PathBuf),
    /// Object fetched by key, reused for `ttl` after each successful fetch
    Remote {
        fetcher: Arc<dyn ObjectFetcher>,
        key: String,
        ttl: Duration,
    },
    /// Nothing configured; always empty
    Empty,
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LocalFile(_) => "local-file",
            Self::Remote { .. } => "remote",
            Self::Empty => "none",
        }
    }

    /// Path or URL of the backing source
    pub fn location(&self) -> Option<String> {
        match self {
            Self::LocalFile(path) => Some(path.display().to_string()),
            Self::Remote { fetcher, key, .. } => Some(fetcher.location(key)),
            Self::Empty => None,
        }
    }
}

/// How a load was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Read from the backend just now
    Fresh,
    /// Last good envelope, either still fresh or kept after a failure
    Cached,
    /// Nothing available
    Empty,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub envelope: Arc<CacheEnvelope>,
    pub kind: LoadKind,
}

impl LoadOutcome {
    fn empty() -> Self {
        Self {
            envelope: Arc::new(CacheEnvelope::default()),
            kind: LoadKind::Empty,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.kind == LoadKind::Fresh
    }
}

/// Minimum wait between failed remote fetches, capped by the TTL
const RETRY_BACKOFF: Duration = Duration::from_secs(15);

struct LastGood {
    envelope: Arc<CacheEnvelope>,
    /// Cleared by `invalidate`
    fetched_at: Option<Instant>,
}

#[derive(Default)]
struct LoaderState {
    last_good: Option<LastGood>,
    /// Set after a failed remote fetch; no new fetch is attempted before it
    retry_at: Option<Instant>,
}

impl LoaderState {
    /// Answer a remote load without fetching, if the cache or a recent
    /// failure allows it
    fn settled(&self, ttl: Duration) -> Option<LoadOutcome> {
        if let Some(cached) = &self.last_good {
            if cached.fetched_at.is_some_and(|at| at.elapsed() < ttl) {
                return Some(LoadOutcome {
                    envelope: cached.envelope.clone(),
                    kind: LoadKind::Cached,
                });
            }
        }
        if self.retry_at.is_some_and(|at| Instant::now() < at) {
            return Some(self.fallback());
        }
        None
    }

    fn fallback(&self) -> LoadOutcome {
        match &self.last_good {
            Some(cached) => LoadOutcome {
                envelope: cached.envelope.clone(),
                kind: LoadKind::Cached,
            },
            None => LoadOutcome::empty(),
        }
    }
}

pub struct SourceLoader {
    backend: Backend,
    decoder: TabularDecoder,
    state: Mutex<LoaderState>,
    /// Held across a backend read so concurrent loads share one fetch
    inflight: Mutex<()>,
}

impl SourceLoader {
    pub fn new(backend: Backend, decoder: TabularDecoder) -> Self {
        Self {
            backend,
            decoder,
            state: Mutex::new(LoaderState::default()),
            inflight: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn decoder(&self) -> &TabularDecoder {
        &self.decoder
    }

    /// Produce the current envelope.
    ///
    /// Concurrent calls against a stale remote cache share one fetch: the
    /// callers queued behind it find the result (or the failure) when the
    /// fetch completes. After a failed fetch, remote loads serve the last
    /// good envelope until the retry backoff has passed.
    pub async fn load(&self) -> LoadOutcome {
        let remote_ttl = match &self.backend {
            Backend::Empty => return LoadOutcome::empty(),
            Backend::Remote { ttl, .. } => Some(*ttl),
            Backend::LocalFile(_) => None,
        };

        if let Some(ttl) = remote_ttl {
            if let Some(outcome) = self.state.lock().await.settled(ttl) {
                debug!(kind = ?outcome.kind, "Serving remote envelope without fetching");
                return outcome;
            }
        }

        let _inflight = self.inflight.lock().await;

        if let Some(ttl) = remote_ttl {
            // Another caller may have fetched while this one waited
            if let Some(outcome) = self.state.lock().await.settled(ttl) {
                return outcome;
            }
        }

        let result = match &self.backend {
            Backend::Empty => return LoadOutcome::empty(),
            Backend::LocalFile(path) => local::read(path, &self.decoder).await,
            Backend::Remote { fetcher, key, .. } => self.fetch_remote(fetcher.as_ref(), key).await,
        };

        let mut state = self.state.lock().await;
        match result {
            Ok(envelope) => {
                info!(
                    source = self.backend.kind(),
                    initiatives = envelope.initiatives.len(),
                    events = envelope.events.len(),
                    "Loaded envelope"
                );
                let envelope = Arc::new(envelope);
                state.last_good = Some(LastGood {
                    envelope: envelope.clone(),
                    fetched_at: Some(Instant::now()),
                });
                state.retry_at = None;
                LoadOutcome {
                    envelope,
                    kind: LoadKind::Fresh,
                }
            }
            Err(e) => {
                if let Some(ttl) = remote_ttl {
                    state.retry_at = Some(Instant::now() + ttl.min(RETRY_BACKOFF));
                }
                if state.last_good.is_some() {
                    warn!(
                        source = ?self.backend.location(),
                        error = %e,
                        "Load failed, keeping last good envelope"
                    );
                } else {
                    warn!(
                        source = ?self.backend.location(),
                        error = %e,
                        "Load failed with nothing cached, serving empty collections"
                    );
                }
                state.fallback()
            }
        }
    }

    /// Force the next load to hit the backend, keeping the envelope as fallback
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.retry_at = None;
        if let Some(cached) = state.last_good.as_mut() {
            cached.fetched_at = None;
        }
    }

    /// Whether a remote envelope is older than its freshness window
    pub async fn is_stale(&self) -> bool {
        match &self.backend {
            Backend::Remote { ttl, .. } => match self.state.lock().await.last_good.as_ref() {
                Some(cached) => !cached.fetched_at.is_some_and(|at| at.elapsed() < *ttl),
                None => true,
            },
            _ => false,
        }
    }

    async fn fetch_remote(&self, fetcher: &dyn ObjectFetcher, key: &str) -> Result<CacheEnvelope> {
        let bytes = fetcher.fetch(key).await?;
        let workbook = remote::is_workbook(key, &bytes);
        let decoder = self.decoder.clone();

        tokio::task::spawn_blocking(move || {
            if workbook {
                decoder.decode_workbook(&bytes)
            } else {
                decoder.decode_json(&bytes)
            }
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SyncError;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Mock fetcher serving a fixed JSON payload, optionally failing
    struct MockFetcher {
        calls: AtomicUsize,
        failing: AtomicBool,
        /// Failing fetches hang for this long first, like a timed-out request
        stall: Duration,
        payload: &'static str,
    }

    impl MockFetcher {
        fn new(payload: &'static str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
                stall: Duration::ZERO,
                payload,
            })
        }

        fn stalling(payload: &'static str, stall: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
                stall,
                payload,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ObjectFetcher for MockFetcher {
        async fn fetch(&self, _key: &str) -> Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                tokio::time::sleep(self.stall).await;
                return Err(SyncError::Remote("connection refused".into()));
            }
            Ok(Bytes::from_static(self.payload.as_bytes()))
        }
    }

    const PAYLOAD: &str = r#"{"initiatives":[{"id":"i1","initiative":"A"}],"events":[]}"#;

    fn remote_loader(fetcher: Arc<MockFetcher>) -> SourceLoader {
        SourceLoader::new(
            Backend::Remote {
                fetcher,
                key: "saap-data.json".into(),
                ttl: Duration::from_secs(60),
            },
            TabularDecoder::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_ttl_window() {
        let fetcher = MockFetcher::new(PAYLOAD);
        let loader = remote_loader(fetcher.clone());

        assert!(loader.load().await.is_fresh());
        let second = loader.load().await;
        assert_eq!(second.kind, LoadKind::Cached);
        assert_eq!(second.envelope.initiatives.len(), 1);
        assert_eq!(fetcher.calls(), 1);
        assert!(!loader.is_stale().await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(loader.is_stale().await);
        assert!(loader.load().await.is_fresh());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_failure_falls_back_to_last_good() {
        let fetcher = MockFetcher::new(PAYLOAD);
        let loader = remote_loader(fetcher.clone());
        loader.load().await;

        fetcher.failing.store(true, Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(120)).await;

        let outcome = loader.load().await;
        assert_eq!(outcome.kind, LoadKind::Cached);
        assert_eq!(outcome.envelope.initiatives[0].id, "i1");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outage_shares_one_fetch_and_backs_off() {
        let fetcher = MockFetcher::stalling(PAYLOAD, Duration::from_secs(10));
        let loader = remote_loader(fetcher.clone());
        loader.load().await;

        fetcher.failing.store(true, Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(61)).await;

        let started = Instant::now();
        let (a, b, c, d, e) = tokio::join!(
            loader.load(),
            loader.load(),
            loader.load(),
            loader.load(),
            loader.load()
        );
        assert!(started.elapsed() <= Duration::from_secs(10));
        assert_eq!(fetcher.calls(), 2);
        for outcome in [a, b, c, d, e] {
            assert_eq!(outcome.kind, LoadKind::Cached);
            assert_eq!(outcome.envelope.initiatives[0].id, "i1");
        }

        // Inside the backoff the last good envelope is served without a fetch
        let started = Instant::now();
        assert_eq!(loader.load().await.kind, LoadKind::Cached);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(fetcher.calls(), 2);

        tokio::time::advance(RETRY_BACKOFF).await;
        fetcher.failing.store(false, Ordering::SeqCst);
        assert!(loader.load().await.is_fresh());
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_skips_backoff() {
        let fetcher = MockFetcher::new(PAYLOAD);
        let loader = remote_loader(fetcher.clone());

        fetcher.failing.store(true, Ordering::SeqCst);
        assert_eq!(loader.load().await.kind, LoadKind::Empty);
        assert_eq!(loader.load().await.kind, LoadKind::Empty);
        assert_eq!(fetcher.calls(), 1);

        fetcher.failing.store(false, Ordering::SeqCst);
        loader.invalidate().await;
        assert!(loader.load().await.is_fresh());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_remote_failure_without_cache_is_empty() {
        let fetcher = MockFetcher::new(PAYLOAD);
        fetcher.failing.store(true, Ordering::SeqCst);
        let loader = remote_loader(fetcher);

        let outcome = loader.load().await;
        assert_eq!(outcome.kind, LoadKind::Empty);
        assert!(outcome.envelope.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_degrades() {
        let fetcher = MockFetcher::new("<html>rate limited</html>");
        let loader = remote_loader(fetcher);
        assert_eq!(loader.load().await.kind, LoadKind::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_fetch() {
        let fetcher = MockFetcher::new(PAYLOAD);
        let loader = remote_loader(fetcher.clone());
        loader.load().await;

        loader.invalidate().await;
        assert!(loader.load().await.is_fresh());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_backend() {
        let loader = SourceLoader::new(Backend::Empty, TabularDecoder::default());
        let outcome = loader.load().await;
        assert_eq!(outcome.kind, LoadKind::Empty);
        assert!(loader.backend().location().is_none());
    }

    #[tokio::test]
    async fn test_local_file_rereads_every_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saap.json");
        std::fs::write(&path, PAYLOAD).unwrap();
        let loader = SourceLoader::new(Backend::LocalFile(path.clone()), TabularDecoder::default());

        assert_eq!(loader.load().await.envelope.initiatives.len(), 1);

        std::fs::write(&path, r#"{"initiatives":[],"events":[{"eventName":"Expo"}]}"#).unwrap();
        let outcome = loader.load().await;
        assert!(outcome.is_fresh());
        assert_eq!(outcome.envelope.events.len(), 1);

        std::fs::remove_file(&path).unwrap();
        let outcome = loader.load().await;
        assert_eq!(outcome.kind, LoadKind::Cached);
        assert_eq!(outcome.envelope.events.len(), 1);
    }
}
