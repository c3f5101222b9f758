pub mod bucket;
pub mod eviction;
pub mod item;
pub mod key;
pub mod kv;
pub mod lookup;
pub mod metrics;
pub mod multiplexer;
pub mod namespace;
pub mod store;

pub use bucket::DomainBucket;
pub use eviction::{EvictionIndex, EvictionScheduler, EvictionSettings, EvictionTicket};
pub use item::{CacheItem, RecordExtra, ResponseSnapshot, SingleRecord, MAX_RESPONSE_VALIDITY};
pub use key::{neutralize_record, normalize_domain, response_key};
pub use kv::{KvStore, KvValue};
pub use lookup::CacheLookup;
pub use metrics::CacheMetrics;
pub use multiplexer::CacheMultiplexer;
pub use namespace::CacheNamespace;
pub use store::NamespaceStore;
