use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

// align(64) keeps `hits` and `misses` on their own cache line, away from the
// counters touched by inserts and the reaper.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct CacheMetrics {
    // Hot counters, updated on every retrieval.
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    _hot_pad: [u64; 6],

    pub insertions: AtomicU64,
    pub rejected_inserts: AtomicU64,
    pub lazy_evictions: AtomicU64,
    pub swept_evictions: AtomicU64,
    pub pruned_domains: AtomicU64,
    pub dropped_tickets: AtomicU64,
}

impl CacheMetrics {
    #[inline]
    pub(super) fn bump(counter: &AtomicU64, by: u64) {
        if by > 0 {
            counter.fetch_add(by, AtomicOrdering::Relaxed);
        }
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(AtomicOrdering::Relaxed) as f64;
        let total = hits + self.misses.load(AtomicOrdering::Relaxed) as f64;

        if total > 0.0 {
            (hits / total) * 100.0
        } else {
            0.0
        }
    }

    /// Total entries removed, lazily or by the reaper.
    pub fn evictions(&self) -> u64 {
        self.lazy_evictions.load(AtomicOrdering::Relaxed)
            + self.swept_evictions.load(AtomicOrdering::Relaxed)
    }
}
