pub mod catalog;
pub mod config;
pub mod degraded;
pub mod magnet;
pub mod preferences;
pub mod rules;
pub mod speed;
pub mod storage;
pub mod testing;

pub use catalog::{
    uniq_tags, Catalog, CatalogError, Confirmation, ImportSummary, MagnetRecord, NewRecord,
    RecordEdit, RecordFilter, SortOrder,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError,
};
pub use degraded::Degradable;
pub use magnet::{is_valid_magnet, parse_magnet, MagnetValidator, ParsedMagnet};
pub use preferences::{Preferences, Theme, SEARCH_HISTORY_LIMIT};
pub use rules::{
    FetchError, Fetcher, HttpFetcher, LinkBuilder, LinkKind, MultiSourceSearch, Reachability,
    ReachabilityProber, RuleSource, RuleSourceLoader, SearchLink, SearchOutcome, SourceCard,
};
pub use speed::{
    format_speed, ClientKind, ClientSettings, SpeedMonitor, SpeedReading, SpeedSource,
    SpeedUpdate,
};
pub use storage::{KvStore, KvStoreExt, MemoryKvStore, SqliteKvStore, StorageError};
