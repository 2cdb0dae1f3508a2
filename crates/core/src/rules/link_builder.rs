//! Candidate search links for a rule.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::{Regex, RegexBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use crate::degraded::Degradable;

use super::{encode_keyword, fill_placeholder, Fetcher, LinkKind, RuleSource, SearchLink, TemplateDescriptor};

pub const LABEL_SEARCH: &str = "Search";
pub const LABEL_TRY_SEARCH: &str = "Try search";
pub const LABEL_HOME: &str = "Home";
pub const LABEL_RULE_FILE: &str = "View rule file";

/// A `.json` path, optionally followed by a query string.
static DESCRIPTOR_URL: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"\.json(\?|$)")
        .case_insensitive(true)
        .build()
        .expect("descriptor pattern is a valid regex")
});

/// Search path guesses appended to a site base. `{}` is the encoded keyword.
const SEARCH_PATH_GUESSES: [&str; 5] = [
    "/search/{}",
    "/search?{}",
    "/?s={}",
    "/search?q={}",
    "/?q={}",
];

/// Whether a rule URL points at a JSON descriptor rather than a site.
pub fn is_descriptor_url(url: &str) -> bool {
    DESCRIPTOR_URL.is_match(url)
}

/// Resolves rules into ordered candidate links.
pub struct LinkBuilder {
    fetcher: Arc<dyn Fetcher>,
}

impl LinkBuilder {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Build the links for one rule. Never empty.
    pub async fn resolve(&self, rule: &RuleSource, keyword: &str) -> Vec<SearchLink> {
        if is_descriptor_url(&rule.url) {
            let descriptor = self.fetch_descriptor(&rule.url).await;
            descriptor_links(rule, &descriptor, keyword)
        } else {
            site_links(&rule.url, keyword)
        }
    }

    /// Fetch and parse a rule's own JSON descriptor.
    pub async fn fetch_descriptor(&self, url: &str) -> Degradable<TemplateDescriptor> {
        let body = match self.fetcher.get_text(url).await {
            Ok(text) => text,
            Err(e) => {
                warn!(url = url, error = %e, "Rule descriptor unavailable");
                return Degradable::degraded(e);
            }
        };

        match serde_json::from_str::<Value>(&body) {
            Ok(json) => Degradable::Ready(TemplateDescriptor::from_json(&json)),
            Err(e) => {
                warn!(url = url, error = %e, "Rule descriptor is not JSON");
                Degradable::degraded(e)
            }
        }
    }
}

/// Links for a descriptor-backed rule.
///
/// A usable template gives a search link and a homepage link; anything else
/// falls back to a single link to the rule file itself.
pub fn descriptor_links(
    rule: &RuleSource,
    descriptor: &Degradable<TemplateDescriptor>,
    keyword: &str,
) -> Vec<SearchLink> {
    let resolved = descriptor
        .as_ready()
        .and_then(|d| d.shape.template().map(|t| (d, t)));

    match resolved {
        Some((descriptor, template)) => {
            debug!(rule = %rule.name, shape = ?descriptor.shape, "Resolved descriptor template");
            vec![
                SearchLink::new(LABEL_SEARCH, fill_placeholder(template, keyword), LinkKind::Primary),
                SearchLink::new(LABEL_HOME, descriptor.homepage(&rule.url), LinkKind::Secondary)
                    .with_warn(descriptor.need_proxy),
            ]
        }
        None => vec![SearchLink::new(LABEL_RULE_FILE, rule.url.clone(), LinkKind::Warn)],
    }
}

/// Links for a plain site: its homepage plus guessed search paths.
///
/// The guesses are unverified; sites with other routing simply won't match.
pub fn site_links(base_url: &str, keyword: &str) -> Vec<SearchLink> {
    let encoded = encode_keyword(keyword);
    let base = base_url.strip_suffix('/').unwrap_or(base_url);

    let mut links = vec![SearchLink::new(LABEL_HOME, base_url, LinkKind::Secondary)];
    let mut seen: Vec<String> = Vec::new();

    for guess in SEARCH_PATH_GUESSES {
        let href = format!("{}{}", base, guess.replace("{}", &encoded));
        if seen.contains(&href) {
            continue;
        }
        let label = if seen.is_empty() {
            LABEL_SEARCH
        } else {
            LABEL_TRY_SEARCH
        };
        links.push(SearchLink::new(label, href.clone(), LinkKind::Primary));
        seen.push(href);
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    #[test]
    fn test_is_descriptor_url() {
        assert!(is_descriptor_url("https://x/rules/site.json"));
        assert!(is_descriptor_url("https://x/site.JSON?v=2"));
        assert!(is_descriptor_url("./local.json"));
        assert!(!is_descriptor_url("https://x/site.json/page"));
        assert!(!is_descriptor_url("https://jsonsite.example/"));
        assert!(!is_descriptor_url("https://x/site.jsonp"));
    }

    #[test]
    fn test_site_links_for_trailing_slash_base() {
        let links = site_links("https://example.com/", "foo bar");
        assert_eq!(links[0].label, LABEL_HOME);
        assert_eq!(links[0].href, "https://example.com/");
        assert_eq!(links[0].kind, LinkKind::Secondary);

        let hrefs: Vec<&str> = links[1..].iter().map(|l| l.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec![
                "https://example.com/search/foo%20bar",
                "https://example.com/search?foo%20bar",
                "https://example.com/?s=foo%20bar",
                "https://example.com/search?q=foo%20bar",
                "https://example.com/?q=foo%20bar",
            ]
        );
        assert_eq!(links[1].label, LABEL_SEARCH);
        assert!(links[2..].iter().all(|l| l.label == LABEL_TRY_SEARCH));
        assert!(links[1..].iter().all(|l| l.kind == LinkKind::Primary));
    }

    #[test]
    fn test_site_links_strip_only_one_slash() {
        let links = site_links("https://example.com//", "k");
        assert_eq!(links[1].href, "https://example.com//search/k");
    }

    #[test]
    fn test_site_links_keep_component_safe_marks() {
        let links = site_links("https://example.com", "Ocean's (2001)!");
        assert_eq!(
            links[1].href,
            "https://example.com/search/Ocean's%20(2001)!"
        );
        assert_eq!(links[3].href, "https://example.com/?s=Ocean's%20(2001)!");
    }

    #[test]
    fn test_descriptor_links_with_template() {
        let rule = RuleSource::new("Site", "https://rules.example/site.json");
        let descriptor = Degradable::Ready(TemplateDescriptor::from_json(&serde_json::json!({
            "searchUrlTemplate": "https://site.example/s/{keyword}",
            "base": "https://site.example",
            "needProxy": true
        })));

        let links = descriptor_links(&rule, &descriptor, "a b");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], SearchLink::new(LABEL_SEARCH, "https://site.example/s/a%20b", LinkKind::Primary));
        assert_eq!(links[1].label, LABEL_HOME);
        assert_eq!(links[1].href, "https://site.example");
        assert_eq!(links[1].kind, LinkKind::Secondary);
        assert!(links[1].warn);
    }

    #[test]
    fn test_descriptor_links_home_defaults_to_rule_url() {
        let rule = RuleSource::new("Site", "https://rules.example/site.json");
        let descriptor = Degradable::Ready(TemplateDescriptor::from_json(&serde_json::json!({
            "search": { "url": "https://site.example/?q=%s" }
        })));

        let links = descriptor_links(&rule, &descriptor, "x");
        assert_eq!(links[1].href, rule.url);
        assert!(!links[1].warn);
    }

    #[test]
    fn test_descriptor_without_template_falls_back() {
        let rule = RuleSource::new("Site", "https://rules.example/site.json");
        let descriptor = Degradable::Ready(TemplateDescriptor::from_json(&serde_json::json!({
            "home": "https://site.example"
        })));

        let links = descriptor_links(&rule, &descriptor, "x");
        assert_eq!(links, vec![SearchLink::new(LABEL_RULE_FILE, rule.url.clone(), LinkKind::Warn)]);
    }

    #[tokio::test]
    async fn test_resolve_descriptor_fetch_failure() {
        let builder = LinkBuilder::new(Arc::new(MockFetcher::new()));
        let rule = RuleSource::new("Broken", "https://rules.example/missing.json?v=1");

        let links = builder.resolve(&rule, "kw").await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].kind, LinkKind::Warn);
        assert_eq!(links[0].href, rule.url);
    }

    #[tokio::test]
    async fn test_resolve_descriptor_invalid_json() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .set_document("https://rules.example/site.json", "{ broken")
            .await;
        let builder = LinkBuilder::new(fetcher);
        let rule = RuleSource::new("Broken", "https://rules.example/site.json");

        let links = builder.resolve(&rule, "kw").await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, LABEL_RULE_FILE);
    }

    #[tokio::test]
    async fn test_resolve_descriptor_success() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .set_document(
                "https://rules.example/site.json",
                r#"{"template":"https://site.example/search?q={query}","home":"https://site.example"}"#,
            )
            .await;
        let builder = LinkBuilder::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>);
        let rule = RuleSource::new("Site", "https://rules.example/site.json");

        let links = builder.resolve(&rule, "ubuntu iso").await;
        assert_eq!(links[0].href, "https://site.example/search?q=ubuntu%20iso");
        assert_eq!(links[1].href, "https://site.example");
        assert_eq!(fetcher.requests_for("https://rules.example/site.json").await, 1);
    }

    #[tokio::test]
    async fn test_resolve_plain_site_never_fetches() {
        let fetcher = Arc::new(MockFetcher::new());
        let builder = LinkBuilder::new(Arc::clone(&fetcher) as Arc<dyn Fetcher>);
        let rule = RuleSource::new("Plain", "https://example.com/");

        let links = builder.resolve(&rule, "foo bar").await;
        assert_eq!(links[0].href, "https://example.com/");
        assert!(links
            .iter()
            .any(|l| l.label == LABEL_SEARCH && l.href.contains("foo%20bar")));
        assert_eq!(fetcher.total_requests().await, 0);
    }
}
