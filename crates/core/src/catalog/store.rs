//! Bookmark CRUD over the key→value store.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::types::{
    uniq_tags, CatalogError, Confirmation, MagnetRecord, NewRecord, RecordEdit, RecordFilter,
    SortOrder,
};
use crate::magnet::{parse_magnet, MagnetValidator};
use crate::storage::{keys, KvStore, KvStoreExt, StorageError};

/// Bookmarked magnet links, newest first in storage order.
pub struct Catalog {
    store: Arc<dyn KvStore>,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl Catalog {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All records in storage order. Entries that no longer deserialize are skipped.
    ///
    /// A stored list that is not valid JSON is an error, so mutations fail
    /// instead of overwriting it.
    pub fn records(&self) -> Result<Vec<MagnetRecord>, CatalogError> {
        let raw: Vec<Value> = self.store.try_get_json(keys::RECORDS)?.unwrap_or_default();
        Ok(raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable stored record");
                    None
                }
            })
            .collect())
    }

    pub(crate) fn save(&self, records: &[MagnetRecord]) -> Result<(), CatalogError> {
        self.store.set_json(keys::RECORDS, records)?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize, CatalogError> {
        Ok(self.records()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CatalogError> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, id: &str) -> Result<MagnetRecord, CatalogError> {
        self.records()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Validate and store a new bookmark at the front of the list.
    pub fn add(
        &self,
        input: NewRecord,
        validator: &MagnetValidator,
    ) -> Result<MagnetRecord, CatalogError> {
        let magnet_uri = validated(&input.magnet_uri, validator)?;
        let now = Utc::now();
        let mut record = MagnetRecord {
            id: Uuid::new_v4().to_string(),
            title: String::new(),
            display_name: String::new(),
            magnet_uri,
            info_hash: String::new(),
            trackers: Vec::new(),
            tags: uniq_tags(&input.tags),
            note: input.note.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        derive_from_magnet(&mut record);
        record.title = title_or_display_name(&input.title, &record.display_name);

        let _guard = self.lock();
        let mut records = self.records()?;
        records.insert(0, record.clone());
        self.save(&records)?;

        info!(id = %record.id, info_hash = %record.info_hash, "Bookmark added");
        Ok(record)
    }

    /// Replace the given fields, revalidating the resulting magnet URI.
    pub fn edit(
        &self,
        id: &str,
        edit: RecordEdit,
        validator: &MagnetValidator,
    ) -> Result<MagnetRecord, CatalogError> {
        let _guard = self.lock();
        let mut records = self.records()?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        let mut record = records[index].clone();
        let magnet_uri = edit.magnet_uri.as_deref().unwrap_or(&record.magnet_uri);
        record.magnet_uri = validated(magnet_uri, validator)?;
        derive_from_magnet(&mut record);

        if let Some(title) = &edit.title {
            record.title = title_or_display_name(title, &record.display_name);
        }
        if let Some(tags) = &edit.tags {
            record.tags = uniq_tags(tags);
        }
        if let Some(note) = &edit.note {
            record.note = note.trim().to_string();
        }
        record.updated_at = Utc::now();

        records[index] = record.clone();
        self.save(&records)?;

        info!(id = %record.id, "Bookmark updated");
        Ok(record)
    }

    /// Remove one bookmark.
    pub fn delete(&self, id: &str, confirmation: Confirmation) -> Result<MagnetRecord, CatalogError> {
        if confirmation != Confirmation::Confirmed {
            return Err(CatalogError::NotConfirmed);
        }

        let _guard = self.lock();
        let mut records = self.records()?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        let removed = records.remove(index);
        self.save(&records)?;

        info!(id = %removed.id, "Bookmark deleted");
        Ok(removed)
    }

    /// Remove every bookmark. Returns how many were removed.
    pub fn clear(&self, confirmation: Confirmation) -> Result<usize, CatalogError> {
        if confirmation != Confirmation::Confirmed {
            return Err(CatalogError::NotConfirmed);
        }

        let _guard = self.lock();
        let count = match self.records() {
            Ok(records) => records.len(),
            Err(CatalogError::Storage(StorageError::Serialization(e))) => {
                warn!(error = %e, "Clearing unreadable catalog");
                0
            }
            Err(e) => return Err(e),
        };
        self.save(&[])?;

        info!(count, "Catalog cleared");
        Ok(count)
    }

    /// Filtered, sorted view of the bookmarks.
    pub fn list(&self, filter: &RecordFilter) -> Result<Vec<MagnetRecord>, CatalogError> {
        let query = filter.query.as_deref().map(str::trim).unwrap_or("");
        let mut items: Vec<MagnetRecord> = self
            .records()?
            .into_iter()
            .filter(|r| r.matches_query(query))
            .filter(|r| r.has_tags(&filter.tags))
            .collect();

        match filter.sort {
            SortOrder::CreatedDesc => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::CreatedAsc => items.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::TitleAsc => items.sort_by_cached_key(|r| r.title.to_lowercase()),
            SortOrder::TitleDesc => {
                items.sort_by(|a, b| b.title.to_lowercase().cmp(&a.title.to_lowercase()))
            }
        }
        Ok(items)
    }
}

fn validated(magnet_uri: &str, validator: &MagnetValidator) -> Result<String, CatalogError> {
    let trimmed = magnet_uri.trim();
    if !validator.is_valid(trimmed) {
        return Err(CatalogError::Validation(if validator.uses_custom_patterns() {
            "does not match any custom pattern".to_string()
        } else {
            "expected magnet:?xt=urn:btih: followed by a 32-40 character hash".to_string()
        }));
    }
    Ok(trimmed.to_string())
}

/// Refresh the fields derived from `magnet_uri`.
pub(crate) fn derive_from_magnet(record: &mut MagnetRecord) {
    let parsed = parse_magnet(&record.magnet_uri);
    record.info_hash = parsed.info_hash_upper();
    record.trackers = parsed.trackers;
    record.display_name = parsed.display_name.unwrap_or_default();
}

fn title_or_display_name(title: &str, display_name: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        display_name.to_string()
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKvStore;

    const HASH: &str = "c9e15763f722f23e98a29decdfae341b98d53056";

    fn catalog() -> Catalog {
        Catalog::new(Arc::new(MemoryKvStore::new()))
    }

    fn magnet(hash: &str, name: &str) -> String {
        format!("magnet:?xt=urn:btih:{}&dn={}&tr=udp%3A%2F%2Ft1&tr=udp%3A%2F%2Ft2", hash, name)
    }

    #[test]
    fn test_add_derives_fields() {
        let catalog = catalog();
        let record = catalog
            .add(
                NewRecord::new(format!("  {}  ", magnet(HASH, "Ubuntu%2024.04")))
                    .with_tags("linux, iso linux")
                    .with_note("  lts "),
                &MagnetValidator::default(),
            )
            .unwrap();

        assert_eq!(record.title, "Ubuntu 24.04");
        assert_eq!(record.display_name, "Ubuntu 24.04");
        assert_eq!(record.info_hash, HASH.to_uppercase());
        assert_eq!(record.trackers, vec!["udp://t1", "udp://t2"]);
        assert_eq!(record.tags, vec!["linux", "iso"]);
        assert_eq!(record.note, "lts");
        assert!(!record.magnet_uri.starts_with(' '));
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(catalog.get(&record.id).unwrap(), record);
    }

    #[test]
    fn test_add_rejects_invalid_magnet() {
        let catalog = catalog();
        let err = catalog
            .add(NewRecord::new("https://not-a-magnet"), &MagnetValidator::default())
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(catalog.is_empty().unwrap());
    }

    #[test]
    fn test_custom_patterns_replace_default_rule() {
        let catalog = catalog();
        let validator = MagnetValidator::new(&["^magnet:\\?xt=urn:sha1:"]);

        assert!(catalog
            .add(NewRecord::new(magnet(HASH, "x")), &validator)
            .is_err());
        let record = catalog
            .add(NewRecord::new("magnet:?xt=urn:sha1:ABC"), &validator)
            .unwrap();
        assert_eq!(record.info_hash, "");
    }

    #[test]
    fn test_new_records_go_first() {
        let catalog = catalog();
        let validator = MagnetValidator::default();
        let first = catalog.add(NewRecord::new(magnet(HASH, "a")), &validator).unwrap();
        let second = catalog
            .add(NewRecord::new(magnet(&"b".repeat(40), "b")), &validator)
            .unwrap();

        let ids: Vec<String> = catalog.records().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_edit_rederives_and_keeps_identity() {
        let catalog = catalog();
        let validator = MagnetValidator::default();
        let original = catalog
            .add(NewRecord::new(magnet(HASH, "old")).with_title("Mine"), &validator)
            .unwrap();

        let other = "a".repeat(40);
        let edited = catalog
            .edit(
                &original.id,
                RecordEdit {
                    magnet_uri: Some(format!("magnet:?xt=urn:btih:{}", other)),
                    tags: Some("new".to_string()),
                    ..RecordEdit::default()
                },
                &validator,
            )
            .unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, original.created_at);
        assert!(edited.updated_at >= original.updated_at);
        assert_eq!(edited.title, "Mine");
        assert_eq!(edited.info_hash, other.to_uppercase());
        assert!(edited.trackers.is_empty());
        assert_eq!(edited.tags, vec!["new"]);
    }

    #[test]
    fn test_edit_invalid_magnet_leaves_record() {
        let catalog = catalog();
        let validator = MagnetValidator::default();
        let original = catalog.add(NewRecord::new(magnet(HASH, "a")), &validator).unwrap();

        let err = catalog
            .edit(
                &original.id,
                RecordEdit {
                    magnet_uri: Some("magnet:?dn=nohash".to_string()),
                    ..RecordEdit::default()
                },
                &validator,
            )
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(catalog.get(&original.id).unwrap(), original);
    }

    #[test]
    fn test_destructive_ops_need_confirmation() {
        let catalog = catalog();
        let validator = MagnetValidator::default();
        let record = catalog.add(NewRecord::new(magnet(HASH, "a")), &validator).unwrap();

        assert!(matches!(
            catalog.delete(&record.id, Confirmation::Declined),
            Err(CatalogError::NotConfirmed)
        ));
        assert!(matches!(
            catalog.clear(Confirmation::Declined),
            Err(CatalogError::NotConfirmed)
        ));
        assert_eq!(catalog.len().unwrap(), 1);

        catalog.delete(&record.id, Confirmation::Confirmed).unwrap();
        assert!(matches!(
            catalog.delete(&record.id, Confirmation::Confirmed),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_clear_counts_removed() {
        let catalog = catalog();
        let validator = MagnetValidator::default();
        catalog.add(NewRecord::new(magnet(HASH, "a")), &validator).unwrap();
        catalog
            .add(NewRecord::new(magnet(&"d".repeat(32), "b")), &validator)
            .unwrap();

        assert_eq!(catalog.clear(Confirmation::Confirmed).unwrap(), 2);
        assert!(catalog.is_empty().unwrap());
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let catalog = catalog();
        let validator = MagnetValidator::default();
        catalog
            .add(
                NewRecord::new(magnet(HASH, "x")).with_title("beta").with_tags("Linux"),
                &validator,
            )
            .unwrap();
        catalog
            .add(
                NewRecord::new(magnet(&"e".repeat(40), "y"))
                    .with_title("Alpha")
                    .with_tags("linux iso")
                    .with_note("Needle in note"),
                &validator,
            )
            .unwrap();

        let by_title = catalog
            .list(&RecordFilter {
                sort: SortOrder::TitleAsc,
                ..RecordFilter::default()
            })
            .unwrap();
        let titles: Vec<&str> = by_title.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "beta"]);

        let tagged = catalog
            .list(&RecordFilter {
                tags: vec!["LINUX".to_string(), "iso".to_string()],
                ..RecordFilter::default()
            })
            .unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].title, "Alpha");

        let queried = catalog
            .list(&RecordFilter {
                query: Some("NEEDLE".to_string()),
                ..RecordFilter::default()
            })
            .unwrap();
        assert_eq!(queried.len(), 1);

        let by_hash = catalog
            .list(&RecordFilter {
                query: Some(&HASH[..8]).map(str::to_string),
                ..RecordFilter::default()
            })
            .unwrap();
        assert_eq!(by_hash[0].title, "beta");
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let store = Arc::new(MemoryKvStore::new());
        store.set(keys::RECORDS, r#"[{"id":"broken"}]"#).unwrap();
        let catalog = Catalog::new(store);
        assert!(catalog.records().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_list_blocks_writes_until_cleared() {
        let store = Arc::new(MemoryKvStore::new());
        let intact = format!(r#"[{{"id":"kept","magnetUri":"{}"}}]"#, magnet(HASH, "x"));
        let truncated = &intact[..intact.len() - 1];
        store.set(keys::RECORDS, truncated).unwrap();
        let catalog = Catalog::new(store.clone());
        let validator = MagnetValidator::default();

        let err = catalog
            .add(NewRecord::new(magnet(HASH, "y")), &validator)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Storage(StorageError::Serialization(_))));
        assert_eq!(store.get(keys::RECORDS).unwrap().as_deref(), Some(truncated));

        assert_eq!(catalog.clear(Confirmation::Confirmed).unwrap(), 0);
        catalog
            .add(NewRecord::new(magnet(HASH, "y")), &validator)
            .unwrap();
        assert_eq!(catalog.len().unwrap(), 1);
    }
}
