pub mod cache;

pub use cache::{
    CacheItem, CacheLookup, CacheMetrics, CacheMultiplexer, CacheNamespace, EvictionSettings,
    KvValue, RecordExtra, ResponseSnapshot, SingleRecord,
};
