use super::index::EvictionIndex;
use super::ticket::EvictionTicket;
use crate::dns::cache::metrics::CacheMetrics;
use crate::dns::cache::store::NamespaceStore;
use compact_str::CompactString;
use ferrous_cache_domain::CacheConfig;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEFAULT_EVICTION_INTERVAL_SECS: u64 = 30;
const DEFAULT_EVICTION_QUEUE_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionSettings {
    pub interval: Duration,
    pub queue_capacity: usize,
    /// Run the reaper. When off the task only waits for shutdown and expiry
    /// happens on retrieval alone.
    pub active: bool,
}

impl Default for EvictionSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_EVICTION_INTERVAL_SECS),
            queue_capacity: DEFAULT_EVICTION_QUEUE_CAPACITY,
            active: false,
        }
    }
}

impl From<&CacheConfig> for EvictionSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.eviction_interval_secs.max(1)),
            queue_capacity: config.eviction_queue_capacity.max(1),
            active: config.active_eviction,
        }
    }
}

/// Background task of one namespace.
pub struct EvictionScheduler {
    namespace: Arc<str>,
    shutdown: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
    queue: Option<mpsc::Sender<EvictionTicket>>,
    metrics: Arc<CacheMetrics>,
}

impl EvictionScheduler {
    /// Spawns the task on the current Tokio runtime.
    pub fn spawn(
        namespace: Arc<str>,
        store: Arc<NamespaceStore>,
        settings: &EvictionSettings,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let metrics = Arc::clone(store.metrics());

        let (queue, handle) = if settings.active {
            let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
            let handle = tokio::spawn(run_reaper(
                Arc::clone(&namespace),
                store,
                rx,
                settings.interval,
                shutdown.clone(),
            ));
            (Some(tx), handle)
        } else {
            let handle = tokio::spawn(run_dormant(Arc::clone(&namespace), shutdown.clone()));
            (None, handle)
        };

        Self {
            namespace,
            shutdown,
            handle: Mutex::new(Some(handle)),
            queue,
            metrics,
        }
    }

    pub fn is_active(&self) -> bool {
        self.queue.is_some()
    }

    /// Hands a ticket to the reaper without blocking. Dropped when the
    /// queue is full or the scheduler is dormant.
    pub fn submit(&self, ticket: EvictionTicket) {
        let Some(queue) = &self.queue else {
            return;
        };

        match queue.try_send(ticket) {
            Ok(()) => {}
            Err(TrySendError::Full(ticket)) => {
                CacheMetrics::bump(&self.metrics.dropped_tickets, 1);
                debug!(
                    namespace = %self.namespace,
                    domain = %ticket.domain,
                    "Eviction queue full, ticket dropped"
                );
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Cancels the task and waits for it to exit. Safe to call repeatedly.
    pub async fn stop(&self) {
        self.shutdown.cancel();

        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(namespace = %self.namespace, error = %e, "Eviction task ended abnormally");
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
            && self
                .handle
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .is_none()
    }
}

impl Drop for EvictionScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_dormant(namespace: Arc<str>, shutdown: CancellationToken) {
    debug!(namespace = %namespace, "Eviction scheduler parked");
    shutdown.cancelled().await;
    debug!(namespace = %namespace, "Eviction scheduler shutting down");
}

async fn run_reaper(
    namespace: Arc<str>,
    store: Arc<NamespaceStore>,
    mut queue: mpsc::Receiver<EvictionTicket>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut index = EvictionIndex::new(interval, clock_now());
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        namespace = %namespace,
        interval_secs = interval.as_secs(),
        "Eviction reaper started"
    );

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(
                    namespace = %namespace,
                    pending = index.len(),
                    "Eviction reaper shutting down"
                );
                break;
            }
            Some(ticket) = queue.recv() => {
                index.schedule(ticket);
            }
            _ = ticker.tick() => {
                sweep(&namespace, &store, &mut index, clock_now());
            }
        }
    }
}

// Follows the Tokio clock so a paused runtime drives the reaper.
#[inline]
fn clock_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Evicts the due tickets that are still expired and prunes the buckets
/// they leave empty. Returns the number of items removed.
pub fn sweep(
    namespace: &str,
    store: &NamespaceStore,
    index: &mut EvictionIndex,
    now: Instant,
) -> usize {
    let due = index.due(now);
    if due.is_empty() {
        return 0;
    }

    let removed = due
        .iter()
        .filter(|ticket| store.evict_ticket(ticket, now))
        .count();

    let mut domains: Vec<&CompactString> = due.iter().map(|ticket| &ticket.domain).collect();
    domains.sort_unstable();
    domains.dedup();
    let pruned = store.prune_empty(domains);

    debug!(
        namespace = %namespace,
        due = due.len(),
        removed,
        pruned,
        pending = index.len(),
        "Eviction sweep completed"
    );
    removed
}
