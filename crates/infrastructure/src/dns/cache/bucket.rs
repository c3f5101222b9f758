use super::item::CacheItem;
use super::lookup::CacheLookup;
use compact_str::CompactString;
use hickory_proto::rr::RecordType;
use rustc_hash::FxHashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

pub type TypeEntries = FxHashMap<CompactString, CacheItem>;
pub type BucketEntries = FxHashMap<RecordType, TypeEntries>;

/// Entry observed as stale during a shared scan.
///
/// `created` identifies the exact item that was seen, so the deferred
/// eviction leaves alone a newer item stored under the same key meanwhile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleEntry {
    pub key: CompactString,
    pub created: Instant,
}

/// Result of the read phase of a retrieval.
#[derive(Debug)]
pub struct Scan {
    pub lookup: CacheLookup,
    pub stale: Vec<StaleEntry>,
}

/// All cached items of one domain name, by record type then item key.
#[derive(Debug, Default)]
pub struct DomainBucket {
    entries: RwLock<BucketEntries>,
}

impl DomainBucket {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, BucketEntries> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, BucketEntries> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Files `item` under its record type and key, replacing any item that
    /// has the same key.
    pub fn store(entries: &mut BucketEntries, item: CacheItem) -> Option<CacheItem> {
        entries
            .entry(item.record_type())
            .or_default()
            .insert(item.item_key().clone(), item)
    }

    /// Collects the live items of `record_type` for the requested mode and
    /// notes the stale ones. Never mutates the bucket.
    pub fn scan(
        entries: &BucketEntries,
        record_type: RecordType,
        want_dnssec: bool,
        now: Instant,
    ) -> Scan {
        let mut stale = Vec::new();
        let mut records = Vec::new();
        let mut extra = None;

        if let Some(items) = entries.get(&record_type) {
            for (key, item) in items {
                if item.is_expired_at(now) {
                    stale.push(StaleEntry {
                        key: key.clone(),
                        created: item.time_created(),
                    });
                    continue;
                }

                match (item, want_dnssec) {
                    (CacheItem::Response(snapshot), true) => match snapshot.materialize(now) {
                        Some(message) => {
                            return Scan {
                                lookup: CacheLookup::Response(Box::new(message)),
                                stale,
                            };
                        }
                        None => stale.push(StaleEntry {
                            key: key.clone(),
                            created: item.time_created(),
                        }),
                    },
                    (CacheItem::Record(single), false) => match single.materialize(now) {
                        Some(record) => {
                            if extra.is_none() {
                                extra = single.extra().cloned();
                            }
                            records.push(record);
                        }
                        None => stale.push(StaleEntry {
                            key: key.clone(),
                            created: item.time_created(),
                        }),
                    },
                    _ => {}
                }
            }
        }

        let lookup = if want_dnssec {
            CacheLookup::NoSecureData
        } else {
            CacheLookup::Records { records, extra }
        };
        Scan { lookup, stale }
    }

    /// Deletes the given stale entries under the exclusive lock.
    ///
    /// An entry is only removed if it is the item that was observed or if
    /// it is expired at `now`. Drops the type map once it is empty.
    pub fn evict(&self, record_type: RecordType, stale: &[StaleEntry], now: Instant) -> usize {
        if stale.is_empty() {
            return 0;
        }

        let mut entries = self.write();
        let Some(items) = entries.get_mut(&record_type) else {
            return 0;
        };

        let mut removed = 0;
        for entry in stale {
            let still_stale = items.get(&entry.key).is_some_and(|item| {
                item.time_created() == entry.created || item.is_expired_at(now)
            });
            if still_stale {
                items.remove(&entry.key);
                removed += 1;
            }
        }

        if items.is_empty() {
            entries.remove(&record_type);
        }
        removed
    }

    /// Removes one item if it is expired at `now`.
    pub fn evict_expired(&self, record_type: RecordType, key: &str, now: Instant) -> bool {
        let mut entries = self.write();
        let Some(items) = entries.get_mut(&record_type) else {
            return false;
        };

        let expired = items.get(key).is_some_and(|item| item.is_expired_at(now));
        if expired {
            items.remove(key);
            if items.is_empty() {
                entries.remove(&record_type);
            }
        }
        expired
    }

    pub fn is_empty(&self) -> bool {
        self.read().values().all(|items| items.is_empty())
    }

    /// Number of stored items across all record types.
    pub fn len(&self) -> usize {
        self.read().values().map(|items| items.len()).sum()
    }
}
