//! Rule-driven multi-source search.
//!
//! A rule names an external site, or a JSON descriptor describing how to
//! search one. For a keyword, every rule is turned into a short ranked list of
//! candidate links, and each source can be probed for reachability.
//!
//! Guessed search paths are heuristics for sites with unknown routing. Nothing
//! here checks that a guessed URL returns results; the prober only reports
//! whether a source's base URL answers at all.

mod fetcher;
mod link_builder;
mod loader;
mod prober;
mod search;
mod template;
mod types;

pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use link_builder::{
    descriptor_links, is_descriptor_url, site_links, LinkBuilder, LABEL_HOME, LABEL_RULE_FILE,
    LABEL_SEARCH, LABEL_TRY_SEARCH,
};
pub use loader::RuleSourceLoader;
pub use prober::{Reachability, ReachabilityProber, DEFAULT_PROBE_TIMEOUT};
pub use search::{CardStatus, MultiSourceSearch, SearchOutcome, SourceCard};
pub use template::{encode_keyword, extract_template, fill_placeholder};
pub use types::*;
