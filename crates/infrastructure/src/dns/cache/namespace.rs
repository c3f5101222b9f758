use super::eviction::{EvictionScheduler, EvictionSettings};
use super::item::CacheItem;
use super::kv::KvStore;
use super::lookup::CacheLookup;
use super::metrics::CacheMetrics;
use super::store::NamespaceStore;
use hickory_proto::rr::RecordType;
use std::sync::Arc;
use std::time::Instant;

/// One isolated cache: domain buckets, KV cells and the background task.
pub struct CacheNamespace {
    name: Arc<str>,
    store: Arc<NamespaceStore>,
    kv: KvStore,
    scheduler: EvictionScheduler,
}

impl CacheNamespace {
    /// Must be called from within a Tokio runtime.
    pub fn start(name: &str, settings: &EvictionSettings) -> Self {
        let name: Arc<str> = Arc::from(name);
        let store = Arc::new(NamespaceStore::new());
        let scheduler = EvictionScheduler::spawn(Arc::clone(&name), Arc::clone(&store), settings);

        Self {
            name,
            store,
            kv: KvStore::new(),
            scheduler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &NamespaceStore {
        &self.store
    }

    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    pub fn metrics(&self) -> &Arc<CacheMetrics> {
        self.store.metrics()
    }

    pub fn scheduler(&self) -> &EvictionScheduler {
        &self.scheduler
    }

    pub fn insert(&self, domain: &str, item: CacheItem) {
        let ticket = self.store.insert(domain, item);
        self.scheduler.submit(ticket);
    }

    pub fn retrieve(
        &self,
        domain: &str,
        record_type: RecordType,
        want_dnssec: bool,
        now: Instant,
    ) -> CacheLookup {
        self.store.retrieve(domain, record_type, want_dnssec, now)
    }

    pub async fn stop(&self) {
        self.scheduler.stop().await;
    }
}
