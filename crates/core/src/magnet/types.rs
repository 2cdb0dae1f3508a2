//! Types produced by the magnet parser.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Decomposed magnet URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMagnet {
    /// First `dn` value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Hash after `urn:btih:` in the first BitTorrent `xt`, as written.
    /// Empty when the URI has no BitTorrent topic.
    pub info_hash: String,
    /// Every `tr` value in encounter order, duplicates kept.
    pub trackers: Vec<String>,
    /// All parameters (lower-cased keys) with their values in encounter order.
    pub params: BTreeMap<String, Vec<String>>,
}

impl ParsedMagnet {
    /// Info hash normalized to uppercase, as stored on records.
    pub fn info_hash_upper(&self) -> String {
        self.info_hash.to_uppercase()
    }

    pub fn has_info_hash(&self) -> bool {
        !self.info_hash.is_empty()
    }

    /// All values for a (case-insensitive) parameter name.
    pub fn values(&self, key: &str) -> &[String] {
        self.params
            .get(&key.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
