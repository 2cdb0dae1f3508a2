//! Multi-source search: rules in, one card of links per source out.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, Stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::preferences::Preferences;

use super::{
    LinkBuilder, Reachability, ReachabilityProber, RuleSource, RuleSourceLoader, SearchLink,
    LABEL_HOME,
};

/// Links generated for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCard {
    pub rule: RuleSource,
    pub links: Vec<SearchLink>,
}

impl SourceCard {
    /// URL whose reachability represents the source: its homepage link,
    /// else the rule URL.
    pub fn probe_target(&self) -> &str {
        self.links
            .iter()
            .find(|l| l.label == LABEL_HOME)
            .map(|l| l.href.as_str())
            .unwrap_or(&self.rule.url)
    }
}

/// Result of one search invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub keyword: String,
    /// One card per rule, in rule-file order.
    pub cards: Vec<SourceCard>,
    /// The rule list could not be loaded; `cards` is empty.
    pub rules_unavailable: bool,
}

/// Reachability of one card, reported as soon as its probe finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStatus {
    pub index: usize,
    pub target: String,
    pub reachability: Reachability,
}

/// Ties the loader, link builder and prober together.
pub struct MultiSourceSearch {
    loader: RuleSourceLoader,
    links: LinkBuilder,
    prober: ReachabilityProber,
    preferences: Option<Arc<Preferences>>,
}

impl MultiSourceSearch {
    pub fn new(loader: RuleSourceLoader, links: LinkBuilder, prober: ReachabilityProber) -> Self {
        Self {
            loader,
            links,
            prober,
            preferences: None,
        }
    }

    /// Record searched keywords in the persisted history.
    pub fn with_history(mut self, preferences: Arc<Preferences>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn loader(&self) -> &RuleSourceLoader {
        &self.loader
    }

    /// Build the cards for `keyword`. A blank keyword does nothing.
    pub async fn search(&self, keyword: &str) -> Option<SearchOutcome> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return None;
        }

        if let Some(prefs) = &self.preferences {
            if let Err(e) = prefs.push_search_history(keyword) {
                warn!(error = %e, "Failed to record search history");
            }
        }

        let loaded = self.loader.load().await;
        let rules_unavailable = loaded.is_degraded();
        let rules = loaded.unwrap_or_neutral();
        debug!(keyword = keyword, rules = rules.len(), "Resolving search links");

        let resolved = futures::future::join_all(
            rules.iter().map(|rule| self.links.resolve(rule, keyword)),
        )
        .await;

        let cards = rules
            .into_iter()
            .zip(resolved)
            .map(|(rule, links)| SourceCard { rule, links })
            .collect();

        Some(SearchOutcome {
            keyword: keyword.to_string(),
            cards,
            rules_unavailable,
        })
    }

    /// Probe every card concurrently.
    ///
    /// Statuses arrive in completion order, not card order.
    pub fn probe_cards(&self, cards: &[SourceCard]) -> impl Stream<Item = CardStatus> + Send + 'static {
        cards
            .iter()
            .enumerate()
            .map(|(index, card)| {
                let prober = self.prober.clone();
                let target = card.probe_target().to_string();
                async move {
                    let reachability = prober.probe(&target).await;
                    CardStatus {
                        index,
                        target,
                        reachability,
                    }
                }
            })
            .collect::<FuturesUnordered<_>>()
    }

    /// Forget the cached rule list.
    pub fn reload_rules(&self) {
        self.loader.invalidate();
    }
}
