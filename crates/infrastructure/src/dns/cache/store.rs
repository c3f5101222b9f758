use super::bucket::DomainBucket;
use super::eviction::EvictionTicket;
use super::item::CacheItem;
use super::key::normalize_domain;
use super::lookup::CacheLookup;
use super::metrics::CacheMetrics;
use compact_str::CompactString;
use hickory_proto::rr::RecordType;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::{debug, trace};

type Buckets = FxHashMap<CompactString, Arc<DomainBucket>>;

/// Domain buckets of one namespace.
///
/// Lock order is always structural lock first, then bucket lock. The
/// structural lock is released as soon as the bucket guard is held, so
/// contention on it is limited to map lookups and bucket creation.
#[derive(Debug, Default)]
pub struct NamespaceStore {
    buckets: RwLock<Buckets>,
    metrics: Arc<CacheMetrics>,
}

impl NamespaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn buckets_read(&self) -> RwLockReadGuard<'_, Buckets> {
        self.buckets.read().unwrap_or_else(|e| e.into_inner())
    }

    #[inline]
    fn buckets_write(&self) -> RwLockWriteGuard<'_, Buckets> {
        self.buckets.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn metrics(&self) -> &Arc<CacheMetrics> {
        &self.metrics
    }

    /// Stores `item` under `domain` and returns the ticket describing when
    /// it expires.
    pub fn insert(&self, domain: &str, item: CacheItem) -> EvictionTicket {
        let domain = normalize_domain(domain);
        let ticket = EvictionTicket {
            domain: domain.clone(),
            record_type: item.record_type(),
            item_key: item.item_key().clone(),
            when: item.expires_at(),
        };

        let mut buckets = self.buckets_write();
        let bucket = Arc::clone(buckets.entry(domain).or_insert_with(Default::default));
        let mut entries = bucket.write();
        drop(buckets);

        let replaced = DomainBucket::store(&mut entries, item).is_some();
        drop(entries);

        CacheMetrics::bump(&self.metrics.insertions, 1);
        trace!(
            domain = %ticket.domain,
            record_type = %ticket.record_type,
            replaced,
            "Stored cache item"
        );
        ticket
    }

    /// Looks up the live items of `record_type` under `domain`, removing the
    /// expired ones it comes across.
    pub fn retrieve(
        &self,
        domain: &str,
        record_type: RecordType,
        want_dnssec: bool,
        now: Instant,
    ) -> CacheLookup {
        let domain = normalize_domain(domain);

        let buckets = self.buckets_read();
        let Some(bucket) = buckets.get(&domain).map(Arc::clone) else {
            drop(buckets);
            CacheMetrics::bump(&self.metrics.misses, 1);
            return CacheLookup::Miss;
        };
        let entries = bucket.read();
        drop(buckets);

        let scan = DomainBucket::scan(&entries, record_type, want_dnssec, now);
        drop(entries);

        if !scan.stale.is_empty() {
            let removed = bucket.evict(record_type, &scan.stale, now);
            CacheMetrics::bump(&self.metrics.lazy_evictions, removed as u64);
            debug!(
                domain = %domain,
                record_type = %record_type,
                removed,
                "Evicted expired cache items"
            );
        }

        if scan.lookup.is_empty() {
            CacheMetrics::bump(&self.metrics.misses, 1);
        } else {
            CacheMetrics::bump(&self.metrics.hits, 1);
        }
        scan.lookup
    }

    /// Removes the item a ticket points at, if it is still expired.
    pub fn evict_ticket(&self, ticket: &EvictionTicket, now: Instant) -> bool {
        let buckets = self.buckets_read();
        let Some(bucket) = buckets.get(&ticket.domain).map(Arc::clone) else {
            return false;
        };
        drop(buckets);

        let removed = bucket.evict_expired(ticket.record_type, &ticket.item_key, now);
        if removed {
            CacheMetrics::bump(&self.metrics.swept_evictions, 1);
        }
        removed
    }

    /// Drops the buckets of `domains` that hold no items anymore.
    pub fn prune_empty<'a, I>(&self, domains: I) -> usize
    where
        I: IntoIterator<Item = &'a CompactString>,
    {
        let mut buckets = self.buckets_write();
        let mut pruned = 0;
        for domain in domains {
            let empty = buckets.get(domain).is_some_and(|bucket| bucket.is_empty());
            if empty {
                buckets.remove(domain);
                pruned += 1;
            }
        }
        drop(buckets);

        CacheMetrics::bump(&self.metrics.pruned_domains, pruned as u64);
        pruned
    }

    pub fn domain_count(&self) -> usize {
        self.buckets_read().len()
    }

    /// Number of items stored across all domains, expired ones included.
    pub fn item_count(&self) -> usize {
        let buckets: Vec<Arc<DomainBucket>> = self.buckets_read().values().cloned().collect();
        buckets.iter().map(|bucket| bucket.len()).sum()
    }
}
