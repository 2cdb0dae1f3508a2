//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::rules::{FetchError, Fetcher};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedFetch {
    Text(String),
    Ping(String),
}

impl RecordedFetch {
    pub fn location(&self) -> &str {
        match self {
            RecordedFetch::Text(l) | RecordedFetch::Ping(l) => l,
        }
    }
}

/// Mock implementation of the Fetcher trait.
///
/// Documents are served from an in-memory map; a location with no document
/// answers `HTTP 404`. Pings succeed unless the URL was marked unreachable,
/// and can be delayed to exercise probe timeouts.
///
/// # Example
///
/// ```rust,ignore
/// let fetcher = Arc::new(MockFetcher::new());
/// fetcher.set_document("./rules.json", r#"{"rules":[]}"#).await;
/// fetcher.set_unreachable("https://down.example").await;
///
/// let loader = RuleSourceLoader::new(fetcher.clone(), store, "./rules.json");
/// loader.load().await;
/// assert_eq!(fetcher.requests_for("./rules.json").await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    documents: Arc<RwLock<HashMap<String, String>>>,
    unreachable: Arc<RwLock<HashSet<String>>>,
    ping_delays: Arc<RwLock<HashMap<String, Duration>>>,
    requests: Arc<RwLock<Vec<RecordedFetch>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `location`.
    pub async fn set_document(&self, location: &str, body: impl Into<String>) {
        self.documents
            .write()
            .await
            .insert(location.to_string(), body.into());
    }

    pub async fn remove_document(&self, location: &str) {
        self.documents.write().await.remove(location);
    }

    /// Make both fetches and pings of `url` fail with a connection error.
    pub async fn set_unreachable(&self, url: &str) {
        self.unreachable.write().await.insert(url.to_string());
    }

    /// Delay pings of `url` before they complete.
    pub async fn set_ping_delay(&self, url: &str, delay: Duration) {
        self.ping_delays
            .write()
            .await
            .insert(url.to_string(), delay);
    }

    /// All recorded requests, in order.
    pub async fn recorded(&self) -> Vec<RecordedFetch> {
        self.requests.read().await.clone()
    }

    /// Number of requests (fetches and pings) made for `location`.
    pub async fn requests_for(&self, location: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.location() == location)
            .count()
    }

    pub async fn total_requests(&self) -> usize {
        self.requests.read().await.len()
    }

    async fn check_reachable(&self, location: &str) -> Result<(), FetchError> {
        if self.unreachable.read().await.contains(location) {
            return Err(FetchError::ConnectionFailed(format!(
                "mock: {} is unreachable",
                location
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get_text(&self, location: &str) -> Result<String, FetchError> {
        self.requests
            .write()
            .await
            .push(RecordedFetch::Text(location.to_string()));
        self.check_reachable(location).await?;

        self.documents
            .read()
            .await
            .get(location)
            .cloned()
            .ok_or(FetchError::Status(404))
    }

    async fn ping(&self, url: &str) -> Result<(), FetchError> {
        self.requests
            .write()
            .await
            .push(RecordedFetch::Ping(url.to_string()));

        let delay = self.ping_delays.read().await.get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_reachable(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_document_is_404() {
        let fetcher = MockFetcher::new();
        let err = fetcher.get_text("./nothing.json").await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
        assert_eq!(fetcher.requests_for("./nothing.json").await, 1);
    }

    #[tokio::test]
    async fn test_records_pings_and_fetches() {
        let fetcher = MockFetcher::new();
        fetcher.set_document("a", "body").await;

        assert_eq!(fetcher.get_text("a").await.unwrap(), "body");
        fetcher.ping("b").await.unwrap();

        assert_eq!(
            fetcher.recorded().await,
            vec![
                RecordedFetch::Text("a".to_string()),
                RecordedFetch::Ping("b".to_string())
            ]
        );
        assert_eq!(fetcher.total_requests().await, 2);
    }
}
