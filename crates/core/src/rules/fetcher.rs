//! Network capability injected into the loader, link builder and prober.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Errors from fetching a rule file, descriptor or probe target.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::ConnectionFailed(e.to_string())
        } else if e.is_decode() || e.is_body() {
            FetchError::Parse(e.to_string())
        } else {
            FetchError::ConnectionFailed(e.to_string())
        }
    }
}

/// Fetch-like capability.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a document as text. Non-success statuses are errors.
    async fn get_text(&self, location: &str) -> Result<String, FetchError>;

    /// Issue a minimal request whose response is not inspected.
    ///
    /// Any completed round trip is `Ok`, whatever the status code.
    async fn ping(&self, url: &str) -> Result<(), FetchError>;
}

/// `Fetcher` over HTTP(S), with plain paths read from the local filesystem.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

fn is_remote(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, location: &str) -> Result<String, FetchError> {
        if !is_remote(location) {
            let path = location.strip_prefix("file://").unwrap_or(location);
            debug!(path = path, "Reading local document");
            return tokio::fs::read_to_string(Path::new(path))
                .await
                .map_err(|e| FetchError::Io(e.to_string()));
        }

        debug!(url = location, "Fetching remote document");
        let response = self
            .client
            .get(location)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    async fn ping(&self, url: &str) -> Result<(), FetchError> {
        if !is_remote(url) {
            return Err(FetchError::ConnectionFailed(format!(
                "not a network location: {}",
                url
            )));
        }
        self.client.head(url).send().await?;
        Ok(())
    }
}
