//! Transmission-like JSON-RPC endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::types::rate_from_json;
use super::{SpeedQueryError, SpeedReading, SpeedSource};

/// Header carrying the RPC session token.
pub const SESSION_HEADER: &str = "x-transmission-session-id";

/// Reads `rateDownload` via `torrent-get`.
///
/// The session token is obtained from the first `session-get` call, where a
/// `409 Conflict` is the expected answer, and cached until `reset`.
pub struct TransmissionSpeedSource {
    client: Client,
    rpc_url: String,
    token: String,
    session: RwLock<Option<String>>,
}

impl TransmissionSpeedSource {
    pub fn new(rpc_url: &str, token: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            rpc_url: rpc_url.to_string(),
            token: token.to_string(),
            session: RwLock::new(None),
        }
    }

    /// Currently cached session token.
    pub async fn cached_session(&self) -> Option<String> {
        self.session.read().await.clone()
    }

    /// Apply the optional `user:password` token as basic auth.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            return request;
        }
        match self.token.split_once(':') {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request.basic_auth(&self.token, None::<&str>),
        }
    }

    fn session_from(response: &Response) -> Option<String> {
        response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    async fn store_session(&self, session: &str) {
        *self.session.write().await = Some(session.to_string());
    }

    /// Return the cached token, fetching it if needed.
    async fn ensure_session(&self) -> Result<String, SpeedQueryError> {
        if let Some(session) = self.session.read().await.clone() {
            return Ok(session);
        }

        let response = self
            .authorize(self.client.post(&self.rpc_url))
            .json(&json!({ "method": "session-get" }))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CONFLICT && !status.is_success() {
            return Err(SpeedQueryError::Status(status.as_u16()));
        }

        let session = Self::session_from(&response).ok_or(SpeedQueryError::NoSession)?;
        debug!("Obtained Transmission session token");
        self.store_session(&session).await;
        Ok(session)
    }

    async fn torrent_get(&self, session: &str, info_hash: &str) -> Result<Response, SpeedQueryError> {
        let body = json!({
            "method": "torrent-get",
            "arguments": {
                "fields": ["hashString", "rateDownload"],
                "ids": [info_hash.to_lowercase()],
            }
        });

        Ok(self
            .authorize(self.client.post(&self.rpc_url))
            .header(SESSION_HEADER, session)
            .json(&body)
            .send()
            .await?)
    }

    async fn query(&self, info_hash: &str) -> Result<u64, SpeedQueryError> {
        let session = self.ensure_session().await?;
        let mut response = self.torrent_get(&session, info_hash).await?;

        // Token rotated server-side: the 409 carries the new one. Retry once.
        if response.status() == StatusCode::CONFLICT {
            let fresh = Self::session_from(&response).ok_or(SpeedQueryError::NoSession)?;
            info!("Transmission session token rotated");
            self.store_session(&fresh).await;
            response = self.torrent_get(&fresh, info_hash).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(SpeedQueryError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        let torrent = body
            .get("arguments")
            .and_then(|a| a.get("torrents"))
            .and_then(|t| t.get(0));
        rate_from_json(torrent.and_then(|t| t.get("rateDownload")))
            .ok_or(SpeedQueryError::MissingRate)
    }
}

#[async_trait]
impl SpeedSource for TransmissionSpeedSource {
    fn name(&self) -> &str {
        "transmission"
    }

    async fn download_rate(&self, info_hash: &str) -> SpeedReading {
        match self.query(info_hash).await {
            Ok(rate) => SpeedReading::Rate(rate),
            Err(e) => {
                debug!(info_hash = info_hash, error = %e, "Transmission rate unavailable");
                SpeedReading::Unknown
            }
        }
    }

    async fn reset(&self) {
        *self.session.write().await = None;
        info!("Transmission session token cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_clears_cached_session() {
        let source = TransmissionSpeedSource::new(
            "http://127.0.0.1:1/transmission/rpc",
            "",
            Duration::from_millis(200),
        );
        source.store_session("abc").await;
        assert_eq!(source.cached_session().await.as_deref(), Some("abc"));

        source.reset().await;
        assert!(source.cached_session().await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_client_reads_unknown() {
        let source = TransmissionSpeedSource::new(
            "http://127.0.0.1:1/transmission/rpc",
            "user:pass",
            Duration::from_millis(500),
        );
        assert_eq!(source.download_rate("ABC").await, SpeedReading::Unknown);
        assert!(source.cached_session().await.is_none());
    }
}
