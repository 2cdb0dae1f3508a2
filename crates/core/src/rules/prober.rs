//! Best-effort reachability checks for source base URLs.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Fetcher;

/// Default hard timeout for a probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(4500);

/// Probe outcome.
///
/// The response is never inspected, so an HTTP error page still counts as
/// reachable. Only timeouts and transport failures are `Blocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reachability {
    Reachable,
    Blocked,
}

impl Reachability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reachability::Reachable => "reachable",
            Reachability::Blocked => "blocked",
        }
    }
}

/// Time-bounded connectivity probe.
///
/// Each call is independent, so callers can await many probes concurrently
/// without a slow source holding up the others.
#[derive(Clone)]
pub struct ReachabilityProber {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
}

impl ReachabilityProber {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_timeout(fetcher, DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_timeout(fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn probe(&self, url: &str) -> Reachability {
        let outcome = tokio::time::timeout(self.timeout, self.fetcher.ping(url)).await;
        match outcome {
            Ok(Ok(())) => Reachability::Reachable,
            Ok(Err(e)) => {
                debug!(url = url, error = %e, "Probe failed");
                Reachability::Blocked
            }
            Err(_) => {
                debug!(url = url, timeout_ms = self.timeout.as_millis() as u64, "Probe timed out");
                Reachability::Blocked
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    #[tokio::test]
    async fn test_completed_round_trip_is_reachable() {
        let fetcher = Arc::new(MockFetcher::new());
        let prober = ReachabilityProber::new(fetcher);
        assert_eq!(prober.probe("https://up.example").await, Reachability::Reachable);
        assert_eq!(prober.timeout(), Duration::from_millis(4500));
    }

    #[tokio::test]
    async fn test_transport_error_is_blocked() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.set_unreachable("https://down.example").await;
        let prober = ReachabilityProber::new(fetcher);
        assert_eq!(prober.probe("https://down.example").await, Reachability::Blocked);
    }

    #[tokio::test]
    async fn test_timeout_is_blocked() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .set_ping_delay("https://slow.example", Duration::from_secs(5))
            .await;
        let prober = ReachabilityProber::with_timeout(fetcher, Duration::from_millis(30));

        let started = std::time::Instant::now();
        assert_eq!(prober.probe("https://slow.example").await, Reachability::Blocked);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
