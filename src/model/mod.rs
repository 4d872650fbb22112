//! Record model shared by the decoder, store, loader and HTTP layer
//!
//! Wire names follow the dashboard UI contract: camelCase fields, the
//! initiative name serialised as `initiative`, and the source row as
//! `rowIndex`.

pub mod patch;
pub mod records;
pub mod status;

pub use patch::{EventPatch, InitiativePatch};
pub use records::{CacheEnvelope, EnvelopeMetadata, EventRecord, InitiativeRecord, RecordKind};
pub use status::InitiativeStatus;

/// Category assigned to events whose category cell is blank
pub const DEFAULT_EVENT_CATEGORY: &str = "Other";
