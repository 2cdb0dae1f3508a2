//! Cancellable polling of download rates for a watched set of info-hashes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::{source_from_settings, ClientSettings, SpeedReading, SpeedSource, SpeedUpdate};

/// Default delay between polling rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// The single live polling task.
struct PollTask {
    handle: JoinHandle<()>,
    watched: Vec<String>,
}

/// Counts a live polling task until its future is dropped.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Polls a `SpeedSource` for the watched items.
///
/// At most one polling task exists. `watch` cancels the previous task and
/// waits for it to finish before starting the next, so timers never stack.
pub struct SpeedMonitor {
    source: Option<Arc<dyn SpeedSource>>,
    interval: Duration,
    current: Mutex<Option<PollTask>>,
    active: Arc<AtomicUsize>,
}

impl SpeedMonitor {
    /// `source` is `None` when no client is configured.
    pub fn new(source: Option<Arc<dyn SpeedSource>>, interval: Duration) -> Self {
        Self {
            source,
            interval: interval.max(Duration::from_millis(1)),
            current: Mutex::new(None),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_settings(
        settings: &ClientSettings,
        interval: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self::new(source_from_settings(settings, request_timeout), interval)
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    /// Number of polling tasks currently alive (0 or 1).
    pub fn active_polls(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Info-hashes of the current polling task.
    pub async fn watched(&self) -> Vec<String> {
        self.current
            .lock()
            .await
            .as_ref()
            .map(|t| t.watched.clone())
            .unwrap_or_default()
    }

    /// Replace the watched set and return the channel of its updates.
    ///
    /// The first round runs immediately, then one round per interval. Blank
    /// hashes are skipped. Without a configured client every item reports
    /// `Unknown` once and no task is started. The previous channel closes.
    pub async fn watch(&self, info_hashes: Vec<String>) -> mpsc::UnboundedReceiver<SpeedUpdate> {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            previous.handle.abort();
            let _ = previous.handle.await;
            debug!(items = previous.watched.len(), "Cancelled previous speed polling");
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let hashes: Vec<String> = info_hashes
            .into_iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();

        let source = match &self.source {
            Some(source) if !hashes.is_empty() => Arc::clone(source),
            Some(_) => return rx,
            None => {
                for info_hash in hashes {
                    let _ = tx.send(SpeedUpdate {
                        info_hash,
                        reading: SpeedReading::Unknown,
                    });
                }
                return rx;
            }
        };

        info!(
            client = source.name(),
            items = hashes.len(),
            interval_ms = self.interval.as_millis() as u64,
            "Starting speed polling"
        );

        let guard = ActiveGuard::new(Arc::clone(&self.active));
        let interval = self.interval;
        let watched = hashes.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                for info_hash in &hashes {
                    let reading = source.download_rate(info_hash).await;
                    let update = SpeedUpdate {
                        info_hash: info_hash.clone(),
                        reading,
                    };
                    if tx.send(update).is_err() {
                        debug!("Speed update receiver dropped, stopping polling");
                        return;
                    }
                }
            }
        });

        *current = Some(PollTask { handle, watched });
        rx
    }

    /// Cancel polling, if any.
    pub async fn stop(&self) {
        if let Some(task) = self.current.lock().await.take() {
            task.handle.abort();
            let _ = task.handle.await;
            info!("Speed polling stopped");
        }
    }

    /// Clear cached client session state (after a settings change).
    pub async fn reset_session(&self) {
        if let Some(source) = &self.source {
            source.reset().await;
        }
    }
}
