//! JSON export and merging import.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::store::{derive_from_magnet, Catalog};
use super::types::{uniq_tags, CatalogError, ImportSummary, MagnetRecord};
use crate::magnet::MagnetValidator;
use crate::storage::StorageError;

/// Lenient shape of an imported entry. Everything but the magnet is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "magnet")]
    magnet_uri: Option<String>,
    #[serde(default)]
    tags: Option<TagsField>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default, alias = "created")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated")]
    updated_at: Option<DateTime<Utc>>,
}

/// Tags may arrive as a list or as a single comma separated string.
///
/// List entries are kept whole; only the string form is split.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagsField {
    List(Vec<String>),
    Text(String),
}

impl TagsField {
    fn into_tags(self) -> Vec<String> {
        match self {
            TagsField::List(list) => {
                let mut tags: Vec<String> = Vec::with_capacity(list.len());
                for tag in list.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                    if !tags.iter().any(|t| t == tag) {
                        tags.push(tag.to_string());
                    }
                }
                tags
            }
            TagsField::Text(text) => uniq_tags(&text),
        }
    }
}

impl Catalog {
    /// All records as a pretty-printed JSON array.
    pub fn export(&self) -> Result<String, CatalogError> {
        let records = self.records()?;
        serde_json::to_string_pretty(&records)
            .map_err(|e| StorageError::Serialization(e.to_string()).into())
    }

    /// Merge a JSON array of records into the catalog.
    ///
    /// An entry whose id already exists is skipped. An entry without an id
    /// is added under a fresh id unless a record with the same magnet URI and
    /// info-hash exists. Entries that are not objects, carry no magnet URI or
    /// fail `validator` are skipped. Nothing is written when the body is not
    /// a JSON array.
    pub fn import(
        &self,
        body: &str,
        validator: &MagnetValidator,
    ) -> Result<ImportSummary, CatalogError> {
        let entries = match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => return Err(CatalogError::ImportFormat("expected a JSON array".to_string())),
            Err(e) => return Err(CatalogError::ImportFormat(e.to_string())),
        };

        let _guard = self.lock();
        let mut records = self.records()?;
        let mut ids: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();
        let mut keys: HashSet<String> = records.iter().map(MagnetRecord::composite_key).collect();
        let mut summary = ImportSummary::default();

        for (position, entry) in entries.into_iter().enumerate() {
            let Some(record) = to_record(entry, validator) else {
                debug!(position, "Skipping unusable import entry");
                summary.skipped += 1;
                continue;
            };

            let (record, new_id) = match record {
                (record, Some(_)) if ids.contains(&record.id) => {
                    debug!(id = %record.id, "Skipping import entry with known id");
                    summary.skipped += 1;
                    continue;
                }
                (record, Some(_)) => (record, false),
                (record, None) if keys.contains(&record.composite_key()) => {
                    summary.skipped += 1;
                    continue;
                }
                (record, None) => (record, true),
            };

            debug!(id = %record.id, generated_id = new_id, "Importing record");
            ids.insert(record.id.clone());
            keys.insert(record.composite_key());
            records.push(record);
            summary.added += 1;
        }

        if summary.added > 0 {
            self.save(&records)?;
        }
        info!(added = summary.added, skipped = summary.skipped, "Import finished");
        Ok(summary)
    }
}

/// Build a record from one imported entry. The second value is the id the
/// entry carried, if any; entries without one get a fresh id.
fn to_record(entry: Value, validator: &MagnetValidator) -> Option<(MagnetRecord, Option<String>)> {
    if !entry.is_object() {
        return None;
    }
    let imported: ImportedRecord = serde_json::from_value(entry).ok()?;
    let magnet_uri = imported.magnet_uri?.trim().to_string();
    if magnet_uri.is_empty() || !validator.is_valid(&magnet_uri) {
        return None;
    }

    let given_id = imported
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    let now = Utc::now();
    let created_at = imported.created_at.unwrap_or(now);

    let mut record = MagnetRecord {
        id: given_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        title: String::new(),
        display_name: String::new(),
        magnet_uri,
        info_hash: String::new(),
        trackers: Vec::new(),
        tags: imported.tags.map(TagsField::into_tags).unwrap_or_default(),
        note: imported.note.unwrap_or_default().trim().to_string(),
        created_at,
        updated_at: imported.updated_at.unwrap_or(created_at),
    };
    derive_from_magnet(&mut record);
    record.title = imported
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| record.display_name.clone());

    Some((record, given_id))
}
