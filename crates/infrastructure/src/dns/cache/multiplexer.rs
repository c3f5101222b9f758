use super::eviction::EvictionSettings;
use super::item::{has_zero_ttl, CacheItem, RecordExtra};
use super::kv::KvValue;
use super::lookup::CacheLookup;
use super::metrics::CacheMetrics;
use super::namespace::CacheNamespace;
use ferrous_cache_domain::{CacheConfig, CacheError};
use hickory_proto::op::Message;
use hickory_proto::rr::{Record, RecordType};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, error, info};

/// Entry point of the cache: routes every call to its named namespace.
///
/// Owned by the resolver; there is no process-wide instance. Unknown
/// namespace names are never an error: inserts are dropped and lookups
/// come back as [`CacheLookup::Miss`].
pub struct CacheMultiplexer {
    namespaces: FxHashMap<Arc<str>, CacheNamespace>,
    order: Vec<Arc<str>>,
}

impl CacheMultiplexer {
    /// Starts one namespace, and its background task, per name.
    ///
    /// Names must be pairwise distinct. Must be called from within a Tokio
    /// runtime.
    pub fn start<S: AsRef<str>>(
        names: &[S],
        settings: EvictionSettings,
    ) -> Result<Self, CacheError> {
        if names.is_empty() {
            error!("Cache started without namespaces");
            return Err(CacheError::NoNamespaces);
        }

        let unique: FxHashSet<&str> = names.iter().map(|name| name.as_ref()).collect();
        if unique.len() != names.len() {
            let err = CacheError::AmbiguousNamespaces {
                supplied: names.len(),
                unique: unique.len(),
            };
            error!(error = %err, "Refusing to start cache");
            return Err(err);
        }

        if Handle::try_current().is_err() {
            error!("Cache started outside of a Tokio runtime");
            return Err(CacheError::RuntimeUnavailable);
        }

        let mut namespaces = FxHashMap::default();
        let mut order = Vec::with_capacity(names.len());
        for name in names {
            let namespace = CacheNamespace::start(name.as_ref(), &settings);
            let key: Arc<str> = Arc::from(name.as_ref());
            order.push(Arc::clone(&key));
            namespaces.insert(key, namespace);
        }

        info!(
            namespaces = ?order,
            active_eviction = settings.active,
            interval_secs = settings.interval.as_secs(),
            "Cache started"
        );

        Ok(Self { namespaces, order })
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        Self::start(config.namespaces.as_slice(), EvictionSettings::from(config))
    }

    /// Stops every background task and waits for all of them. Idempotent.
    pub async fn stop(&self) {
        for name in &self.order {
            if let Some(namespace) = self.namespaces.get(name) {
                namespace.stop().await;
            }
        }
        info!("Cache stopped");
    }

    pub fn namespace(&self, name: &str) -> Option<&CacheNamespace> {
        self.namespaces.get(name)
    }

    /// Namespace names in start order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|name| &**name)
    }

    pub fn metrics(&self, name: &str) -> Option<&Arc<CacheMetrics>> {
        self.namespaces.get(name).map(CacheNamespace::metrics)
    }

    pub fn insert(
        &self,
        namespace: &str,
        domain: &str,
        record: Record,
        extra: Option<Arc<RecordExtra>>,
    ) {
        self.insert_at(namespace, domain, record, extra, Instant::now());
    }

    pub fn insert_at(
        &self,
        namespace: &str,
        domain: &str,
        record: Record,
        extra: Option<Arc<RecordExtra>>,
        now: Instant,
    ) {
        let Some(ns) = self.namespaces.get(namespace) else {
            debug!(namespace, "Insert into unknown cache namespace dropped");
            return;
        };

        if record.ttl() == 0 {
            CacheMetrics::bump(&ns.metrics().rejected_inserts, 1);
            return;
        }

        ns.insert(domain, CacheItem::record(record, extra, now));
    }

    /// Caches a whole response for DNSSEC lookups, one per query type.
    pub fn insert_response(&self, namespace: &str, domain: &str, message: Message) {
        self.insert_response_at(namespace, domain, message, Instant::now());
    }

    pub fn insert_response_at(
        &self,
        namespace: &str,
        domain: &str,
        message: Message,
        now: Instant,
    ) {
        let Some(ns) = self.namespaces.get(namespace) else {
            debug!(namespace, "Insert into unknown cache namespace dropped");
            return;
        };

        if has_zero_ttl(&message) {
            CacheMetrics::bump(&ns.metrics().rejected_inserts, 1);
            return;
        }

        match CacheItem::response(message, now) {
            Some(item) => ns.insert(domain, item),
            None => {
                CacheMetrics::bump(&ns.metrics().rejected_inserts, 1);
                debug!(namespace, domain, "Response without question not cached");
            }
        }
    }

    pub fn retrieve(
        &self,
        namespace: &str,
        domain: &str,
        record_type: RecordType,
        want_dnssec: bool,
    ) -> CacheLookup {
        self.retrieve_at(namespace, domain, record_type, want_dnssec, Instant::now())
    }

    pub fn retrieve_at(
        &self,
        namespace: &str,
        domain: &str,
        record_type: RecordType,
        want_dnssec: bool,
        now: Instant,
    ) -> CacheLookup {
        match self.namespaces.get(namespace) {
            Some(ns) => ns.retrieve(domain, record_type, want_dnssec, now),
            None => CacheLookup::Miss,
        }
    }

    /// Stores a KV cell. No-op for an unknown namespace.
    pub fn put(&self, namespace: &str, key: &str, value: impl Into<KvValue>) {
        if let Some(ns) = self.namespaces.get(namespace) {
            ns.kv().put(key, value);
        }
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<KvValue> {
        self.namespaces.get(namespace)?.kv().get(key)
    }

    pub fn get_string(&self, namespace: &str, key: &str) -> Option<Arc<str>> {
        self.namespaces.get(namespace)?.kv().get_string(key)
    }

    pub fn get_int(&self, namespace: &str, key: &str) -> Option<i64> {
        self.namespaces.get(namespace)?.kv().get_int(key)
    }

    pub fn get_bool(&self, namespace: &str, key: &str) -> Option<bool> {
        self.namespaces.get(namespace)?.kv().get_bool(key)
    }
}
