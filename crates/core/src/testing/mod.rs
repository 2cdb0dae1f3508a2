//! Testing utilities and mock implementations.
//!
//! Mocks for the network seams (`Fetcher`, `SpeedSource`) so the loader,
//! link builder, prober and speed monitor can be exercised without real
//! sites or torrent clients.
//!
//! # Example
//!
//! ```rust,ignore
//! use magnetkeeper_core::testing::{fixtures, MockFetcher};
//!
//! let fetcher = Arc::new(MockFetcher::new());
//! fetcher
//!     .set_document("./rules.json", fixtures::rules_document(&[
//!         fixtures::rule_source("Site", "https://site.example/"),
//!     ]))
//!     .await;
//! ```

mod mock_fetcher;
mod mock_speed_source;

pub use mock_fetcher::{MockFetcher, RecordedFetch};
pub use mock_speed_source::MockSpeedSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::NewRecord;
    use crate::rules::RuleSource;

    /// A 40 character info-hash made of one repeated character.
    pub fn info_hash(c: char) -> String {
        c.to_string().repeat(40)
    }

    /// A magnet URI with a display name and percent-encoded trackers.
    pub fn magnet_uri(info_hash: &str, name: &str, trackers: &[&str]) -> String {
        let mut uri = format!(
            "magnet:?xt=urn:btih:{}&dn={}",
            info_hash,
            urlencoding::encode(name)
        );
        for tracker in trackers {
            uri.push_str("&tr=");
            uri.push_str(&urlencoding::encode(tracker));
        }
        uri
    }

    /// Bookmark input for a magnet built by `magnet_uri`.
    pub fn new_record(c: char, name: &str) -> NewRecord {
        NewRecord::new(magnet_uri(&info_hash(c), name, &["udp://tracker.example:1337"]))
    }

    pub fn rule_source(name: &str, url: &str) -> RuleSource {
        RuleSource::new(name, url)
    }

    /// A rule file body listing `rules`.
    pub fn rules_document(rules: &[RuleSource]) -> String {
        serde_json::json!({ "rules": rules }).to_string()
    }
}
