//! Live transfer-rate lookups against a torrent client's HTTP API.
//!
//! This module provides a `SpeedSource` trait with qBittorrent-like and
//! Transmission-like implementations, and a `SpeedMonitor` that polls a
//! source for the currently watched info-hashes.

mod format;
mod monitor;
mod qbittorrent;
mod transmission;
mod types;

pub use format::format_speed;
pub use monitor::{SpeedMonitor, DEFAULT_POLL_INTERVAL};
pub use qbittorrent::QBittorrentSpeedSource;
pub use transmission::{TransmissionSpeedSource, SESSION_HEADER};
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

/// Build the source described by the stored client settings.
///
/// Returns `None` when no client URL is configured.
pub fn source_from_settings(
    settings: &ClientSettings,
    request_timeout: Duration,
) -> Option<Arc<dyn SpeedSource>> {
    let settings = settings.normalized();
    if !settings.is_configured() {
        return None;
    }
    let source: Arc<dyn SpeedSource> = match settings.kind {
        ClientKind::QBittorrent => Arc::new(QBittorrentSpeedSource::new(
            &settings.url,
            &settings.token,
            request_timeout,
        )),
        ClientKind::Transmission => Arc::new(TransmissionSpeedSource::new(
            &settings.url,
            &settings.token,
            request_timeout,
        )),
    };
    Some(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_settings() {
        let timeout = Duration::from_secs(1);
        assert!(source_from_settings(&ClientSettings::default(), timeout).is_none());

        let blank = ClientSettings {
            kind: ClientKind::Transmission,
            url: "   ".to_string(),
            token: String::new(),
        };
        assert!(source_from_settings(&blank, timeout).is_none());

        let qb = ClientSettings {
            kind: ClientKind::QBittorrent,
            url: "http://localhost:8080/api/v2".to_string(),
            token: String::new(),
        };
        assert_eq!(source_from_settings(&qb, timeout).unwrap().name(), "qbittorrent");

        let tr = ClientSettings {
            kind: ClientKind::Transmission,
            url: "http://localhost:9091/transmission/rpc".to_string(),
            token: String::new(),
        };
        assert_eq!(source_from_settings(&tr, timeout).unwrap().name(), "transmission");
    }
}
