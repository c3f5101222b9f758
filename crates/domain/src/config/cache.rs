use serde::{Deserialize, Serialize};

use crate::namespaces::{CACHE_IANA, CACHE_OPENNIC};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// One isolated cache per name. Names must be pairwise distinct.
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<String>,

    /// Width of one slot of the eviction index, in seconds.
    #[serde(default = "default_eviction_interval_secs")]
    pub eviction_interval_secs: u64,

    #[serde(default = "default_eviction_queue_capacity")]
    pub eviction_queue_capacity: usize,

    /// Run the background reaper. When disabled, expired entries are only
    /// removed when a retrieval observes them.
    #[serde(default)]
    pub active_eviction: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespaces: default_namespaces(),
            eviction_interval_secs: default_eviction_interval_secs(),
            eviction_queue_capacity: default_eviction_queue_capacity(),
            active_eviction: false,
        }
    }
}

fn default_namespaces() -> Vec<String> {
    vec![CACHE_IANA.to_string(), CACHE_OPENNIC.to_string()]
}

fn default_eviction_interval_secs() -> u64 {
    30
}

fn default_eviction_queue_capacity() -> usize {
    1000
}
