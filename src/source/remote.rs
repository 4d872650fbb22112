//! Remote object backend
//!
//! Objects are fetched by key from a base URL (an object store, a raw
//! file host, anything that answers `GET <base>/<key>`).

use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::types::{Result, SyncError};

/// Extensions treated as workbooks regardless of content
const WORKBOOK_EXTENSIONS: [&str; 3] = [".xlsx", ".xls", ".ods"];

/// Fetches raw object bytes (allows mocking in tests)
#[async_trait::async_trait]
pub trait ObjectFetcher: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Bytes>;

    /// Human-readable location of `key`, for status reporting
    fn location(&self, key: &str) -> String {
        key.to_string()
    }
}

/// `ObjectFetcher` over plain HTTP(S)
pub struct HttpFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("saap-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl ObjectFetcher for HttpFetcher {
    async fn fetch(&self, key: &str) -> Result<Bytes> {
        let url = self.location(key);
        debug!(url = %url, "Fetching remote object");

        let response = self
            .client
            .get(&url)
            .header("Cache-Control", "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Remote(format!("{} returned {}", url, status)));
        }

        Ok(response.bytes().await?)
    }

    fn location(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

/// Whether a fetched object should be decoded as a workbook rather than JSON
pub fn is_workbook(key: &str, bytes: &[u8]) -> bool {
    let key = key.to_ascii_lowercase();
    WORKBOOK_EXTENSIONS.iter().any(|ext| key.ends_with(ext)) || bytes.starts_with(b"PK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_sniffing() {
        assert!(is_workbook("data/SAAP.xlsx", b"anything"));
        assert!(is_workbook("legacy.XLS", b""));
        assert!(is_workbook("blob", b"PK\x03\x04rest"));
        assert!(!is_workbook("saap-data.json", b"{\"initiatives\":[]}"));
    }

    #[test]
    fn test_http_location_joins_cleanly() {
        let fetcher = HttpFetcher::new("https://example.com/bucket/", Duration::from_secs(1));
        assert_eq!(
            fetcher.location("/saap-data.json"),
            "https://example.com/bucket/saap-data.json"
        );
    }
}
