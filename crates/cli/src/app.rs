//! Services shared by the commands.

use std::sync::Arc;

use anyhow::{Context, Result};

use magnetkeeper_core::{
    Catalog, Config, Fetcher, HttpFetcher, KvStore, LinkBuilder, MagnetValidator,
    MultiSourceSearch, Preferences, ReachabilityProber, RuleSourceLoader, SpeedMonitor,
    SqliteKvStore,
};

pub struct App {
    pub config: Config,
    pub catalog: Catalog,
    pub preferences: Arc<Preferences>,
    store: Arc<dyn KvStore>,
    fetcher: Arc<dyn Fetcher>,
}

impl App {
    pub fn open(config: Config) -> Result<Self> {
        let store: Arc<dyn KvStore> = Arc::new(
            SqliteKvStore::new(&config.database.path).with_context(|| {
                format!("Failed to open database {:?}", config.database.path)
            })?,
        );
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config.rules.fetch_timeout()));

        Ok(Self {
            catalog: Catalog::new(store.clone()),
            preferences: Arc::new(Preferences::new(store.clone())),
            store,
            fetcher,
            config,
        })
    }

    /// Validator for the stored custom patterns.
    pub fn validator(&self) -> Result<MagnetValidator> {
        self.preferences
            .validator()
            .context("Failed to read custom patterns")
    }

    pub fn loader(&self) -> RuleSourceLoader {
        RuleSourceLoader::new(
            self.fetcher.clone(),
            self.store.clone(),
            self.config.rules.location.clone(),
        )
    }

    pub fn search(&self) -> MultiSourceSearch {
        MultiSourceSearch::new(
            self.loader(),
            LinkBuilder::new(self.fetcher.clone()),
            ReachabilityProber::with_timeout(self.fetcher.clone(), self.config.probe.timeout()),
        )
        .with_history(self.preferences.clone())
    }

    /// Monitor for the stored client settings.
    pub fn speed_monitor(&self) -> Result<SpeedMonitor> {
        let settings = self
            .preferences
            .client_settings()
            .context("Failed to read client settings")?;
        Ok(SpeedMonitor::from_settings(
            &settings,
            self.config.speed.poll_interval(),
            self.config.speed.request_timeout(),
        ))
    }
}
