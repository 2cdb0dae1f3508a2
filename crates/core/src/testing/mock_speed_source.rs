//! Mock speed source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::speed::{SpeedReading, SpeedSource};

/// Mock implementation of the SpeedSource trait.
///
/// Hashes without a configured rate read as `Unknown`. Every query is
/// counted so polling cadence can be asserted.
#[derive(Debug, Default)]
pub struct MockSpeedSource {
    rates: Arc<RwLock<HashMap<String, u64>>>,
    calls: Arc<RwLock<HashMap<String, usize>>>,
    resets: Arc<RwLock<usize>>,
}

impl MockSpeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_rate(&self, info_hash: &str, bytes_per_sec: u64) {
        self.rates
            .write()
            .await
            .insert(info_hash.to_string(), bytes_per_sec);
    }

    pub async fn clear_rate(&self, info_hash: &str) {
        self.rates.write().await.remove(info_hash);
    }

    /// Number of queries made for `info_hash`.
    pub async fn calls_for(&self, info_hash: &str) -> usize {
        self.calls
            .read()
            .await
            .get(info_hash)
            .copied()
            .unwrap_or(0)
    }

    pub async fn reset_count(&self) -> usize {
        *self.resets.read().await
    }
}

#[async_trait]
impl SpeedSource for MockSpeedSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download_rate(&self, info_hash: &str) -> SpeedReading {
        *self
            .calls
            .write()
            .await
            .entry(info_hash.to_string())
            .or_insert(0) += 1;
        self.rates.read().await.get(info_hash).copied().into()
    }

    async fn reset(&self) {
        *self.resets.write().await += 1;
    }
}
