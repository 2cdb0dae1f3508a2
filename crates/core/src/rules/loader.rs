//! Loading the list of searchable sources.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::degraded::Degradable;
use crate::storage::{keys, KvStore, KvStoreExt};

use super::{Fetcher, RuleSource};

/// Loads the rule list from a fixed location, with a persisted cache.
///
/// Fetch and parse failures degrade to an empty list; they never reach the
/// caller as errors.
pub struct RuleSourceLoader {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn KvStore>,
    location: String,
}

impl RuleSourceLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>, store: Arc<dyn KvStore>, location: impl Into<String>) -> Self {
        Self {
            fetcher,
            store,
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Return the cached list, or fetch, cache and return it.
    ///
    /// A non-empty cache short-circuits all network access. A degraded result
    /// carries no sources.
    pub async fn load(&self) -> Degradable<Vec<RuleSource>> {
        if let Some(cached) = self.cached() {
            debug!(count = cached.len(), "Using cached rule sources");
            return Degradable::Ready(cached);
        }

        let fetched = self
            .fetcher
            .get_text(&self.location)
            .await
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));

        let body = match fetched {
            Ok(body) => body,
            Err(reason) => {
                warn!(location = %self.location, error = %reason, "Rule file unavailable");
                return Degradable::degraded(reason);
            }
        };

        let sources = parse_rule_list(&body);
        if let Err(e) = self.store.set_json(keys::RULE_SOURCES_CACHE, &sources) {
            warn!(error = %e, "Failed to cache rule sources");
        }
        info!(count = sources.len(), location = %self.location, "Loaded rule sources");

        Degradable::Ready(sources)
    }

    /// Drop the cached list so the next `load` fetches again.
    pub fn invalidate(&self) {
        match self.store.remove(keys::RULE_SOURCES_CACHE) {
            Ok(()) => info!("Rule source cache cleared"),
            Err(e) => warn!(error = %e, "Failed to clear rule source cache"),
        }
    }

    fn cached(&self) -> Option<Vec<RuleSource>> {
        match self.store.get_json::<Vec<RuleSource>>(keys::RULE_SOURCES_CACHE) {
            Ok(Some(list)) if !list.is_empty() => Some(list),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read rule source cache");
                None
            }
        }
    }
}

/// Extract `rules` from a rule file body.
///
/// A missing or non-array `rules` field yields an empty list. Entries that do
/// not describe a source (no string `url`) are skipped.
pub(crate) fn parse_rule_list(body: &Value) -> Vec<RuleSource> {
    let Some(entries) = body.get("rules").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<RuleSource>(entry.clone()) {
            Ok(rule) => Some(rule),
            Err(e) => {
                debug!(error = %e, "Skipping malformed rule entry");
                None
            }
        })
        .collect()
}
