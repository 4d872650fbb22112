//! Configuration for the sync service
//!
//! CLI arguments and environment variable handling using clap. A `.env`
//! file in the working directory is loaded before parsing.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::decode::{IdentityMode, LayoutPreset, TabularDecoder, WorkbookLayout};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Which backend this deployment reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    LocalFile(PathBuf),
    Remote { url: String, key: String },
    Empty,
}

/// SAAP sync - spreadsheet-backed planning data with live updates
#[derive(Parser, Debug, Clone)]
#[command(name = "saap-sync")]
#[command(about = "Serves SAAP planning data from a workbook with live sync")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3001")]
    pub listen: SocketAddr,

    /// Local workbook (or JSON envelope) to serve, watch and write back to
    #[arg(long, env = "SAAP_WORKBOOK")]
    pub workbook: Option<PathBuf>,

    /// Base URL of the remote object store
    #[arg(long, env = "SAAP_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Object key under the remote base URL (.json envelope or workbook)
    #[arg(long, env = "SAAP_REMOTE_KEY", default_value = "saap-data.json")]
    pub remote_key: String,

    /// Seconds a fetched remote envelope stays fresh
    #[arg(long, env = "SAAP_REMOTE_TTL_SECS", default_value = "60")]
    pub remote_ttl_secs: u64,

    /// Remote fetch timeout in milliseconds
    #[arg(long, env = "SAAP_REMOTE_TIMEOUT_MS", default_value = "10000")]
    pub remote_timeout_ms: u64,

    /// Column layout of the workbook
    #[arg(long, env = "SAAP_LAYOUT", value_enum, default_value = "dashboard")]
    pub layout: LayoutPreset,

    /// Revenue target used when the data carries none
    #[arg(long, env = "SAAP_REVENUE_TARGET", default_value = "1000000")]
    pub revenue_target: f64,

    /// Quiet period after a workbook change before reloading (ms)
    #[arg(long, env = "SAAP_WATCH_DEBOUNCE_MS", default_value = "1000")]
    pub watch_debounce_ms: u64,

    /// Seconds between SSE heartbeats
    #[arg(long, env = "SAAP_HEARTBEAT_SECS", default_value = "30")]
    pub heartbeat_secs: u64,

    /// Give records a fresh random id on every load instead of a row-derived one
    #[arg(long, env = "SAAP_RANDOM_IDS", default_value = "false")]
    pub random_ids: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.workbook.is_some() && self.remote_url.is_some() {
            return Err("SAAP_WORKBOOK and SAAP_REMOTE_URL are mutually exclusive".to_string());
        }

        if self.remote_url.is_some() && self.remote_key.trim().is_empty() {
            return Err("SAAP_REMOTE_KEY must not be empty".to_string());
        }

        if self.remote_ttl_secs == 0 {
            return Err("SAAP_REMOTE_TTL_SECS must be greater than zero".to_string());
        }

        if self.heartbeat_secs == 0 {
            return Err("SAAP_HEARTBEAT_SECS must be greater than zero".to_string());
        }

        if !self.revenue_target.is_finite() || self.revenue_target < 0.0 {
            return Err("SAAP_REVENUE_TARGET must be a non-negative number".to_string());
        }

        Ok(())
    }

    pub fn deployment(&self) -> Deployment {
        match (&self.workbook, &self.remote_url) {
            (Some(path), _) => Deployment::LocalFile(path.clone()),
            (None, Some(url)) => Deployment::Remote {
                url: url.clone(),
                key: self.remote_key.clone(),
            },
            (None, None) => Deployment::Empty,
        }
    }

    pub fn identity(&self) -> IdentityMode {
        if self.random_ids {
            IdentityMode::Random
        } else {
            IdentityMode::RowDerived
        }
    }

    pub fn decoder(&self) -> TabularDecoder {
        TabularDecoder::new(WorkbookLayout::from_preset(self.layout), self.identity())
    }

    pub fn remote_ttl(&self) -> Duration {
        Duration::from_secs(self.remote_ttl_secs)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.watch_debounce_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}
