//! SAAP sync - spreadsheet-backed planning data for the SAAP dashboard
//!
//! Reads initiatives and events from a planning workbook (or a JSON
//! envelope fetched from an object store), serves them over a small REST
//! API and pushes change notifications to connected dashboards.
//!
//! ## Components
//!
//! - **Decode**: workbook and JSON payloads into typed records
//! - **Store**: the current generation of records, filters and stats
//! - **Source**: local file, remote object with freshness window, or nothing
//! - **Sync**: change watcher, write-back and SSE fanout
//! - **Server**: hyper HTTP server and REST routes
//! - **Convert**: offline workbook to JSON envelope for object stores

pub mod config;
pub mod convert;
pub mod decode;
pub mod logging;
pub mod model;
pub mod routes;
pub mod server;
pub mod source;
pub mod store;
pub mod sync;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, SyncError};
