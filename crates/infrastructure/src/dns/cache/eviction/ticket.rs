use compact_str::CompactString;
use hickory_proto::rr::RecordType;
use std::time::Instant;

/// Pending eviction of one cached item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionTicket {
    /// Normalized domain name of the bucket holding the item.
    pub domain: CompactString,
    pub record_type: RecordType,
    pub item_key: CompactString,
    /// Instant at which the item expires.
    pub when: Instant,
}
