//! Record Store
//!
//! In-memory holder of the current generation of initiatives and events.
//! A generation is an `Arc<CacheEnvelope>`; readers clone the `Arc` and
//! keep a consistent pair of collections for as long as they need it,
//! while reloads swap the whole envelope in one step.

pub mod filters;
pub mod stats;

pub use filters::{EventFilter, InitiativeFilter};
pub use stats::{DashboardStats, StatusCounts};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::model::{CacheEnvelope, EventPatch, EventRecord, InitiativePatch, InitiativeRecord};

struct Generation {
    envelope: Arc<CacheEnvelope>,
    /// Incremented on every `replace_all`
    number: u64,
    loaded_at: Option<DateTime<Utc>>,
}

/// Injectable store of the current collections
pub struct RecordStore {
    current: RwLock<Generation>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Create an empty store (generation 0)
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Generation {
                envelope: Arc::new(CacheEnvelope::default()),
                number: 0,
                loaded_at: None,
            }),
        }
    }

    /// Swap in a new generation, returning its number
    pub async fn replace_all(&self, envelope: impl Into<Arc<CacheEnvelope>>) -> u64 {
        let envelope = envelope.into();
        let mut current = self.current.write().await;
        current.envelope = envelope;
        current.number += 1;
        current.loaded_at = Some(Utc::now());
        debug!(
            generation = current.number,
            initiatives = current.envelope.initiatives.len(),
            events = current.envelope.events.len(),
            "Store replaced"
        );
        current.number
    }

    /// The current generation; never a mix of two generations
    pub async fn snapshot(&self) -> Arc<CacheEnvelope> {
        self.current.read().await.envelope.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.current.read().await.number
    }

    /// When the current generation was swapped in
    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.current.read().await.loaded_at
    }

    pub async fn get_initiative(&self, id: &str) -> Option<InitiativeRecord> {
        let current = self.current.read().await;
        current.envelope.initiatives.iter().find(|r| r.id == id).cloned()
    }

    pub async fn get_event(&self, id: &str) -> Option<EventRecord> {
        let current = self.current.read().await;
        current.envelope.events.iter().find(|r| r.id == id).cloned()
    }

    /// Merge `patch` onto the initiative with `id`, in place.
    ///
    /// Returns `None` and leaves the store untouched when no record matches.
    pub async fn apply_initiative_update(
        &self,
        id: &str,
        patch: &InitiativePatch,
    ) -> Option<InitiativeRecord> {
        let mut current = self.current.write().await;
        let pos = current.envelope.initiatives.iter().position(|r| r.id == id)?;
        let envelope = Arc::make_mut(&mut current.envelope);
        let record = &mut envelope.initiatives[pos];
        patch.apply(record);
        Some(record.clone())
    }

    /// Merge `patch` onto the event with `id`, in place
    pub async fn apply_event_update(&self, id: &str, patch: &EventPatch) -> Option<EventRecord> {
        let mut current = self.current.write().await;
        let pos = current.envelope.events.iter().position(|r| r.id == id)?;
        let envelope = Arc::make_mut(&mut current.envelope);
        let record = &mut envelope.events[pos];
        patch.apply(record);
        Some(record.clone())
    }
}
