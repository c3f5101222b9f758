use ferrous_cache_domain::kv_keys::{KV_TCP_PREFERENCE, KV_TLS_CAPABILITY};
use ferrous_cache_domain::namespaces::{CACHE_IANA, CACHE_OPENNIC};
use ferrous_cache_domain::{map_key, CacheConfig, CacheError};
use ferrous_cache_infrastructure::dns::{
    CacheLookup, CacheMultiplexer, EvictionSettings, KvValue, RecordExtra,
};
use hickory_proto::rr::rdata::{A, CNAME};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::str::FromStr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn start_cache() -> CacheMultiplexer {
    let names = [CACHE_IANA, CACHE_OPENNIC];
    CacheMultiplexer::start(&names, EvictionSettings::default())
        .unwrap()
}

fn a_record(domain: &str, ttl: u32, ip: [u8; 4]) -> Record {
    Record::from_rdata(
        Name::from_str(domain).unwrap(),
        ttl,
        RData::A(A::new(ip[0], ip[1], ip[2], ip[3])),
    )
}

fn records(lookup: &CacheLookup) -> Vec<Record> {
    lookup.as_records().map(<[Record]>::to_vec).unwrap_or_default()
}

fn lookup_a(cache: &CacheMultiplexer, namespace: &str, domain: &str) -> CacheLookup {
    cache.retrieve(namespace, domain, RecordType::A, false)
}

fn lookup_a_at(cache: &CacheMultiplexer, at: Instant) -> CacheLookup {
    cache.retrieve_at(CACHE_IANA, "example.com", RecordType::A, false, at)
}

fn insert_example_at(cache: &CacheMultiplexer, ttl: u32, ip: [u8; 4], at: Instant) {
    let record = a_record("example.com.", ttl, ip);
    cache.insert_at(CACHE_IANA, "example.com", record, None, at);
}

#[tokio::test]
async fn test_ttl_counts_down_then_expires() {
    let cache = start_cache();
    let t0 = Instant::now();

    insert_example_at(&cache, 10, [1, 2, 3, 4], t0);

    let lookup = lookup_a_at(&cache, t0 + Duration::from_secs(3));
    let found = records(&lookup);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].ttl(), 7);

    let lookup = lookup_a_at(&cache, t0 + Duration::from_secs(11));
    assert!(lookup.is_empty());

    let lookup = lookup_a_at(&cache, t0 + Duration::from_secs(3));
    assert!(lookup.is_empty(), "an evicted record must not come back");

    cache.stop().await;
}

#[tokio::test]
async fn test_zero_ttl_record_is_not_stored() {
    let cache = start_cache();

    let record = a_record("example.com.", 0, [1, 2, 3, 4]);
    cache.insert(CACHE_IANA, "example.com", record, None);

    assert!(lookup_a(&cache, CACHE_IANA, "example.com").is_miss());
    let metrics = cache.metrics(CACHE_IANA).unwrap();
    assert_eq!(metrics.rejected_inserts.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.insertions.load(Ordering::Relaxed), 0);

    cache.stop().await;
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let cache = start_cache();
    let t0 = Instant::now();
    insert_example_at(&cache, 300, [1, 2, 3, 4], t0);
    insert_example_at(&cache, 300, [5, 6, 7, 8], t0);

    let at = t0 + Duration::from_secs(20);
    let first = records(&lookup_a_at(&cache, at));
    let second = records(&lookup_a_at(&cache, at));

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert!(first.iter().all(|r| r.ttl() == 280));

    cache.stop().await;
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let cache = start_cache();
    let record = a_record("example.com.", 60, [1, 2, 3, 4]);
    cache.insert(CACHE_IANA, "example.com", record, None);

    assert!(lookup_a(&cache, CACHE_OPENNIC, "example.com").is_miss());
    assert_eq!(records(&lookup_a(&cache, CACHE_IANA, "example.com")).len(), 1);

    cache.stop().await;
}

#[tokio::test]
async fn test_unknown_namespace_is_silent() {
    let cache = start_cache();

    let record = a_record("example.com.", 60, [1, 2, 3, 4]);
    cache.insert("nope", "example.com", record, None);
    cache.put("nope", "k", "v");

    assert!(lookup_a(&cache, "nope", "example.com").is_miss());
    assert!(cache.retrieve("nope", "example.com", RecordType::A, true).is_miss());
    assert!(cache.get("nope", "k").is_none());
    assert!(cache.namespace("nope").is_none());

    cache.stop().await;
}

#[tokio::test]
async fn test_same_record_coalesces_to_latest_ttl() {
    let cache = start_cache();
    let t0 = Instant::now();

    insert_example_at(&cache, 30, [1, 2, 3, 4], t0);
    insert_example_at(&cache, 90, [1, 2, 3, 4], t0);

    let found = records(&lookup_a_at(&cache, t0));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].ttl(), 90);
    assert_eq!(cache.namespace(CACHE_IANA).unwrap().store().item_count(), 1);

    cache.stop().await;
}

#[tokio::test]
async fn test_domain_lookup_ignores_case() {
    let cache = start_cache();
    let record = a_record("www.example.com.", 60, [1, 2, 3, 4]);
    cache.insert(CACHE_IANA, "WWW.Example.COM", record, None);

    assert_eq!(records(&lookup_a(&cache, CACHE_IANA, "www.example.com")).len(), 1);
    assert_eq!(records(&lookup_a(&cache, CACHE_IANA, "Www.Example.Com")).len(), 1);

    cache.stop().await;
}

#[tokio::test]
async fn test_record_type_filters_results() {
    let cache = start_cache();
    let cname = Record::from_rdata(
        Name::from_str("alias.example.com.").unwrap(),
        60,
        RData::CNAME(CNAME(Name::from_str("example.com.").unwrap())),
    );
    cache.insert(CACHE_IANA, "alias.example.com", cname, None);

    let lookup = lookup_a(&cache, CACHE_IANA, "alias.example.com");
    assert!(lookup.is_empty());
    assert!(!lookup.is_miss());

    let lookup = cache.retrieve(CACHE_IANA, "alias.example.com", RecordType::CNAME, false);
    let found = records(&lookup);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].record_type(), RecordType::CNAME);

    cache.stop().await;
}

#[tokio::test]
async fn test_negative_metadata_is_returned() {
    let cache = start_cache();
    let redirect = Record::from_rdata(
        Name::from_str("www.example.com.").unwrap(),
        60,
        RData::CNAME(CNAME(Name::from_str("example.com.").unwrap())),
    );
    let extra = Arc::new(RecordExtra {
        cname: true,
        redirect: vec![redirect],
        ..RecordExtra::default()
    });

    cache.insert(
        CACHE_IANA,
        "www.example.com",
        a_record("example.com.", 60, [1, 2, 3, 4]),
        Some(extra),
    );

    let lookup = lookup_a(&cache, CACHE_IANA, "www.example.com");
    let extra = lookup.extra().unwrap();
    assert!(extra.cname);
    assert!(!extra.nxdomain);
    assert_eq!(extra.redirect.len(), 1);

    cache.stop().await;
}

#[tokio::test]
async fn test_kv_round_trip() {
    let cache = start_cache();

    cache.put(CACHE_IANA, "k", "v");
    assert_eq!(cache.get_string(CACHE_IANA, "k").as_deref(), Some("v"));
    assert_eq!(cache.get_int(CACHE_IANA, "k"), None);
    assert_eq!(cache.get_string(CACHE_OPENNIC, "k"), None);

    let tls_key = map_key(KV_TLS_CAPABILITY, "192.0.2.1");
    cache.put(CACHE_IANA, &tls_key, true);
    assert_eq!(cache.get_bool(CACHE_IANA, &tls_key), Some(true));

    let tcp_key = map_key(KV_TCP_PREFERENCE, "192.0.2.1");
    cache.put(CACHE_IANA, &tcp_key, 3i64);
    assert_eq!(cache.get_int(CACHE_IANA, &tcp_key), Some(3));
    assert!(matches!(cache.get(CACHE_IANA, &tcp_key), Some(KvValue::Int(3))));

    cache.stop().await;
}

#[tokio::test]
async fn test_duplicate_namespaces_refuse_to_start() {
    let names = ["iana", "opennic", "iana"];
    let err = CacheMultiplexer::start(&names, EvictionSettings::default())
        .err()
        .unwrap();

    assert_eq!(err, CacheError::AmbiguousNamespaces { supplied: 3, unique: 2 });
}

#[tokio::test]
async fn test_empty_namespace_list_refused() {
    let names: [&str; 0] = [];
    let err = CacheMultiplexer::start(&names, EvictionSettings::default())
        .err()
        .unwrap();
    assert_eq!(err, CacheError::NoNamespaces);
}

#[test]
fn test_start_requires_runtime() {
    let err = CacheMultiplexer::start(&["iana"], EvictionSettings::default())
        .err()
        .unwrap();
    assert_eq!(err, CacheError::RuntimeUnavailable);
}

#[tokio::test]
async fn test_from_config_keeps_order() {
    let config = CacheConfig {
        namespaces: vec!["b".to_string(), "a".to_string(), "c".to_string()],
        ..CacheConfig::default()
    };
    let cache = CacheMultiplexer::from_config(&config).unwrap();

    assert_eq!(cache.namespaces().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    cache.stop().await;
}

#[tokio::test]
async fn test_stop_joins_every_scheduler_and_is_idempotent() {
    let cache = start_cache();

    cache.stop().await;
    for name in [CACHE_IANA, CACHE_OPENNIC] {
        assert!(cache.namespace(name).unwrap().scheduler().is_stopped());
    }
    cache.stop().await;

    // Lookups keep working after the background tasks are gone.
    let record = a_record("example.com.", 60, [1, 2, 3, 4]);
    cache.insert(CACHE_IANA, "example.com", record, None);
    assert_eq!(records(&lookup_a(&cache, CACHE_IANA, "example.com")).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_and_reads() {
    let cache = Arc::new(start_cache());
    let mut handles = Vec::new();

    for worker in 0..8u8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for i in 0..50u8 {
                let domain = format!("host{}.example.com", i % 5);
                let record = a_record(&format!("{domain}."), 120, [10, worker, 0, i]);
                cache.insert(CACHE_IANA, &domain, record, None);
                let _ = cache.retrieve(CACHE_IANA, &domain, RecordType::A, false);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let store = cache.namespace(CACHE_IANA).unwrap().store();
    assert_eq!(store.domain_count(), 5);
    assert_eq!(store.item_count(), 8 * 50);

    cache.stop().await;
}
