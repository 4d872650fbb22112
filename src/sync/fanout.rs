//! Notification Fanout - Server-Sent Events to connected dashboards
//!
//! Subscribers are kept in an explicit registry of bounded channels. A
//! broadcast serialises the payload once and offers the framed event to
//! every channel; a channel that is closed or full is dropped from the
//! registry. Nothing is queued for subscribers that connect later.
//!
//! ## Event Types
//!
//! - `connected` - sent once to each new subscriber
//! - `fileChanged` - the backing workbook was reloaded after a change on disk
//! - `refresh` - a reload was forced through the API
//! - `heartbeat` - periodic keep-alive

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use hyper::body::{Body, Frame};
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const EVENT_CONNECTED: &str = "connected";
pub const EVENT_FILE_CHANGED: &str = "fileChanged";
pub const EVENT_REFRESH: &str = "refresh";
pub const EVENT_HEARTBEAT: &str = "heartbeat";

/// Frames buffered per subscriber before it counts as failed
const DEFAULT_BUFFER: usize = 64;

/// Format one SSE frame
pub fn frame(event: &str, data: &serde_json::Value) -> Bytes {
    Bytes::from(format!("event: {}\ndata: {}\n\n", event, data))
}

/// Registry of open SSE subscribers
pub struct SyncHub {
    subscribers: DashMap<u64, mpsc::Sender<Bytes>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl Default for SyncHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncHub {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_BUFFER)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Register a subscriber and return the response body that streams to it.
    ///
    /// The `connected` event is queued before the subscriber becomes visible
    /// to broadcasts, so it is always the first frame.
    pub fn subscribe(self: &Arc<Self>) -> SseBody {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);

        let hello = frame(
            EVENT_CONNECTED,
            &json!({ "message": "Connected to sync stream" }),
        );
        // Fresh channel with capacity >= 1
        let _ = tx.try_send(hello);

        self.subscribers.insert(id, tx);
        info!(client_id = id, clients = self.subscribers.len(), "SSE client connected");

        SseBody {
            id,
            rx,
            hub: Arc::downgrade(self),
        }
    }

    /// Send `payload` as event `event` to every subscriber, returning how many
    /// received it
    pub fn broadcast<T: Serialize>(&self, event: &str, payload: &T) -> usize {
        let data = match serde_json::to_value(payload) {
            Ok(data) => data,
            Err(e) => {
                warn!(event = %event, error = %e, "Failed to serialise broadcast payload");
                return 0;
            }
        };
        let bytes = frame(event, &data);

        let mut failed = Vec::new();
        let mut delivered = 0;
        for entry in self.subscribers.iter() {
            match entry.value().try_send(bytes.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => failed.push(*entry.key()),
            }
        }

        for id in failed {
            if self.subscribers.remove(&id).is_some() {
                debug!(client_id = id, "Dropped unresponsive SSE client");
            }
        }

        debug!(event = %event, delivered, "Broadcast sync event");
        delivered
    }

    pub fn client_count(&self) -> usize {
        self.subscribers.len()
    }

    fn unsubscribe(&self, id: u64) {
        if self.subscribers.remove(&id).is_some() {
            info!(client_id = id, clients = self.subscribers.len(), "SSE client disconnected");
        }
    }

    /// Broadcast a `heartbeat` every `period` until the hub is dropped
    pub fn spawn_heartbeat(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let hub = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(hub) = hub.upgrade() else { break };
                if hub.client_count() > 0 {
                    let time = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
                    hub.broadcast(EVENT_HEARTBEAT, &json!({ "time": time }));
                }
            }
        })
    }
}

/// Streaming response body for one SSE subscriber.
///
/// Dropping the body (the connection closed) removes the subscriber.
pub struct SseBody {
    id: u64,
    rx: mpsc::Receiver<Bytes>,
    hub: Weak<SyncHub>,
}

impl Body for SseBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.get_mut()
            .rx
            .poll_recv(cx)
            .map(|next| next.map(|bytes| Ok(Frame::data(bytes))))
    }
}

impl Drop for SseBody {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}
