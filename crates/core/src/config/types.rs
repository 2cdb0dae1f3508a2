use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub speed: SpeedConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file holding the key→value state
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("magnetkeeper.db")
}

/// Rule file configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RulesConfig {
    /// Local path or http(s) URL of the rule file
    #[serde(default = "default_rules_location")]
    pub location: String,
    /// Transport timeout for rule files and descriptors (default: 15)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl RulesConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            location: default_rules_location(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_rules_location() -> String {
    "./rules.json".to_string()
}

fn default_fetch_timeout() -> u64 {
    15
}

/// Reachability probe configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_timeout")]
    pub timeout_ms: u64,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout(),
        }
    }
}

fn default_probe_timeout() -> u64 {
    4500
}

/// Speed polling configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpeedConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Transport timeout for client API calls (default: 10)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl SpeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5000
}

fn default_request_timeout() -> u64 {
    10
}
