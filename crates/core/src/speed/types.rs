//! Types for transfer-rate lookups.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::format_speed;

/// Supported torrent client APIs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientKind {
    #[default]
    #[serde(rename = "qb", alias = "qbittorrent")]
    QBittorrent,
    #[serde(rename = "transmission", alias = "tr")]
    Transmission,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::QBittorrent => "qb",
            ClientKind::Transmission => "transmission",
        }
    }
}

impl FromStr for ClientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "qb" | "qbittorrent" => Ok(ClientKind::QBittorrent),
            "tr" | "transmission" => Ok(ClientKind::Transmission),
            other => Err(format!("unknown torrent client type: {}", other)),
        }
    }
}

/// Stored torrent-client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub kind: ClientKind,
    /// API base URL. Empty means no client is configured.
    pub url: String,
    /// Bearer token (qBittorrent) or `user:password` (Transmission).
    pub token: String,
}

impl ClientSettings {
    /// Settings with surrounding whitespace removed.
    pub fn normalized(&self) -> Self {
        Self {
            kind: self.kind,
            url: self.url.trim().to_string(),
            token: self.token.trim().to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Client settings safe to display (token hidden).
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedClientSettings {
    pub kind: String,
    pub url: String,
    pub token_configured: bool,
}

impl From<&ClientSettings> for SanitizedClientSettings {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            kind: settings.kind.as_str().to_string(),
            url: settings.url.clone(),
            token_configured: !settings.token.is_empty(),
        }
    }
}

/// A download rate, or the neutral marker when it could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedReading {
    /// Bytes per second.
    Rate(u64),
    Unknown,
}

impl SpeedReading {
    pub fn bytes_per_sec(&self) -> Option<u64> {
        match self {
            SpeedReading::Rate(b) => Some(*b),
            SpeedReading::Unknown => None,
        }
    }
}

impl From<Option<u64>> for SpeedReading {
    fn from(value: Option<u64>) -> Self {
        value.map(SpeedReading::Rate).unwrap_or(SpeedReading::Unknown)
    }
}

impl fmt::Display for SpeedReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_speed(self.bytes_per_sec()))
    }
}

/// One reading published by the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedUpdate {
    pub info_hash: String,
    pub reading: SpeedReading,
}

/// Why a single rate query failed. Never surfaced past `SpeedSource`.
#[derive(Debug, Error)]
pub enum SpeedQueryError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Session token unavailable")]
    NoSession,

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("No rate in response")]
    MissingRate,
}

impl From<reqwest::Error> for SpeedQueryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SpeedQueryError::Timeout
        } else if e.is_decode() || e.is_body() {
            SpeedQueryError::Parse(e.to_string())
        } else {
            SpeedQueryError::ConnectionFailed(e.to_string())
        }
    }
}

/// A torrent client that can report download rates.
#[async_trait]
pub trait SpeedSource: Send + Sync {
    /// Client name for logging.
    fn name(&self) -> &str;

    /// Current download rate for an info-hash. Failures read as `Unknown`.
    async fn download_rate(&self, info_hash: &str) -> SpeedReading;

    /// Drop any cached session state.
    async fn reset(&self) {}
}

/// Read a non-negative numeric rate from a JSON value.
pub(crate) fn rate_from_json(value: Option<&serde_json::Value>) -> Option<u64> {
    let rate = value?.as_f64()?;
    if rate.is_finite() && rate >= 0.0 {
        Some(rate.round() as u64)
    } else {
        None
    }
}
