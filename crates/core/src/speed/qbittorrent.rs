//! qBittorrent-like properties endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::types::rate_from_json;
use super::{SpeedQueryError, SpeedReading, SpeedSource};

/// Reads `dlspeed` from `GET <base>/torrents/properties?hash=<INFOHASH>`.
pub struct QBittorrentSpeedSource {
    client: Client,
    base_url: String,
    token: String,
}

impl QBittorrentSpeedSource {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn properties_url(&self, info_hash: &str) -> String {
        format!(
            "{}/torrents/properties?hash={}",
            self.base_url,
            urlencoding::encode(info_hash)
        )
    }

    async fn query(&self, info_hash: &str) -> Result<u64, SpeedQueryError> {
        let mut request = self.client.get(self.properties_url(info_hash));
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SpeedQueryError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        rate_from_json(body.get("dlspeed")).ok_or(SpeedQueryError::MissingRate)
    }
}

#[async_trait]
impl SpeedSource for QBittorrentSpeedSource {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn download_rate(&self, info_hash: &str) -> SpeedReading {
        match self.query(info_hash).await {
            Ok(rate) => SpeedReading::Rate(rate),
            Err(e) => {
                debug!(info_hash = info_hash, error = %e, "qBittorrent rate unavailable");
                SpeedReading::Unknown
            }
        }
    }
}
