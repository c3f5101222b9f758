//! Well-known keys of the per-namespace key-value store.
//!
//! Resolver-side flags are usually scoped to a peer with [`map_key`], e.g.
//! `map_key(KV_TLS_CAPABILITY, "192.0.2.1")`.

/// Peer answers over DNS-over-TLS.
pub const KV_TLS_CAPABILITY: &str = "tlscap";

/// Peer prefers TCP over UDP.
pub const KV_TCP_PREFERENCE: &str = "tcppref";

/// Peer chokes on EDNS0, queries must be sent without an OPT record.
pub const KV_EDNS_ALLERGY: &str = "skipedns";

pub const KV_DS_RR_NUM: &str = "ds_rr_num";
pub const KV_DNSKEY_RR_NUM: &str = "dnskey_rr_num";

/// Joins `prefix` and `suffix` with a colon.
pub fn map_key(prefix: &str, suffix: &str) -> String {
    let mut key = String::with_capacity(prefix.len() + suffix.len() + 1);
    key.push_str(prefix);
    key.push(':');
    key.push_str(suffix);
    key
}
