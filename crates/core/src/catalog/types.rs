//! Types for the bookmark catalog.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

/// A bookmarked magnet link.
///
/// Serialized with camelCase keys; the short keys of older exports
/// (`magnet`, `dn`, `tr`, `created`, `updated`) are accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetRecord {
    /// Generated at creation, never changed.
    pub id: String,
    /// Display name; the magnet's `dn` when the user gave none.
    #[serde(default)]
    pub title: String,
    /// `dn` parsed from the magnet URI.
    #[serde(default, alias = "dn")]
    pub display_name: String,
    /// Raw magnet URI as entered (trimmed).
    #[serde(alias = "magnet")]
    pub magnet_uri: String,
    /// Uppercase info-hash, empty when the URI has no btih topic.
    #[serde(default)]
    pub info_hash: String,
    #[serde(default, alias = "tr")]
    pub trackers: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub note: String,
    #[serde(alias = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated")]
    pub updated_at: DateTime<Utc>,
}

impl MagnetRecord {
    /// Title to show: the title, else the display name, else the info-hash.
    pub fn display_title(&self) -> &str {
        [&self.title, &self.display_name, &self.info_hash]
            .into_iter()
            .map(|s| s.as_str())
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }

    /// Key used to match imported records that carry no id.
    pub fn composite_key(&self) -> String {
        composite_key(&self.magnet_uri, &self.info_hash)
    }

    /// Whether every `wanted` tag (compared case-insensitively) is present.
    pub fn has_tags(&self, wanted: &[String]) -> bool {
        let own: Vec<String> = self.tags.iter().map(|t| t.to_lowercase()).collect();
        wanted.iter().all(|t| own.contains(&t.to_lowercase()))
    }

    /// Case-insensitive substring match over the searchable fields.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let mut hay = vec![
            self.title.as_str(),
            self.note.as_str(),
            self.info_hash.as_str(),
            self.magnet_uri.as_str(),
        ];
        hay.extend(self.tags.iter().map(String::as_str));
        hay.join(" ").to_lowercase().contains(&needle)
    }
}

fn composite_key(magnet_uri: &str, info_hash: &str) -> String {
    format!("{}|{}", magnet_uri, info_hash)
}

/// Input for a new bookmark.
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
    pub title: String,
    pub magnet_uri: String,
    /// Raw tag input, separated by commas or spaces.
    pub tags: String,
    pub note: String,
}

impl NewRecord {
    pub fn new(magnet_uri: impl Into<String>) -> Self {
        Self {
            magnet_uri: magnet_uri.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Fields to replace on an existing bookmark. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct RecordEdit {
    pub title: Option<String>,
    pub magnet_uri: Option<String>,
    /// Raw tag input, replaces all tags.
    pub tags: Option<String>,
    pub note: Option<String>,
}

impl RecordEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.magnet_uri.is_none()
            && self.tags.is_none()
            && self.note.is_none()
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    CreatedDesc,
    CreatedAsc,
    TitleAsc,
    TitleDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::CreatedDesc => "created_desc",
            SortOrder::CreatedAsc => "created_asc",
            SortOrder::TitleAsc => "title_asc",
            SortOrder::TitleDesc => "title_desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created_desc" | "" => Ok(SortOrder::CreatedDesc),
            "created_asc" => Ok(SortOrder::CreatedAsc),
            "title_asc" => Ok(SortOrder::TitleAsc),
            "title_desc" => Ok(SortOrder::TitleDesc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Listing filter.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Free-text query, matched case-insensitively.
    pub query: Option<String>,
    /// Every tag must be present.
    pub tags: Vec<String>,
    pub sort: SortOrder,
}

/// Explicit answer for destructive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

/// Result of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub skipped: usize,
}

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid magnet link: {0}")]
    Validation(String),

    #[error("Import failed: {0}")]
    ImportFormat(String),

    #[error("Operation not confirmed")]
    NotConfirmed,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Split raw tag input on commas (ASCII or full-width) and spaces,
/// dropping blanks and exact duplicates while keeping first-seen order.
pub fn uniq_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input
        .split([',', ' ', '，'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uniq_tags() {
        assert_eq!(uniq_tags("linux, iso，ubuntu  linux"), vec!["linux", "iso", "ubuntu"]);
        assert_eq!(uniq_tags("Linux,linux"), vec!["Linux", "linux"]);
        assert!(uniq_tags(" , ").is_empty());
    }

    #[test]
    fn test_legacy_keys_deserialize() {
        let record: MagnetRecord = serde_json::from_value(json!({
            "id": "1",
            "title": "",
            "dn": "Ubuntu",
            "magnet": "magnet:?xt=urn:btih:abc",
            "infoHash": "ABC",
            "tr": ["udp://t"],
            "created": "2024-01-01T00:00:00Z",
            "updated": "2024-01-02T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.display_name, "Ubuntu");
        assert_eq!(record.trackers, vec!["udp://t"]);
        assert_eq!(record.display_title(), "Ubuntu");

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["magnetUri"], "magnet:?xt=urn:btih:abc");
        assert!(out.get("createdAt").is_some());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("title_desc".parse::<SortOrder>().unwrap(), SortOrder::TitleDesc);
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::CreatedDesc);
        assert!("newest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_confirmation_from_bool() {
        assert_eq!(Confirmation::from(true), Confirmation::Confirmed);
        assert_eq!(Confirmation::from(false), Confirmation::Declined);
    }
}
