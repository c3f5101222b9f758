use compact_str::CompactString;
use hickory_proto::rr::rdata::SOA;
use hickory_proto::rr::{RData, Record, RecordType};

/// Prefix of the item key under which a full DNSSEC response is filed.
pub const DNSSEC_DESIGNATION: &str = "dnssec-";

/// Lower-cases a domain name for use as a namespace map key.
///
/// Borrows the input unchanged when it is already lower case, which is the
/// common case for names coming off the wire.
#[inline]
pub fn normalize_domain(domain: &str) -> CompactString {
    if domain.bytes().any(|b| b.is_ascii_uppercase()) {
        CompactString::from(domain.to_ascii_lowercase())
    } else {
        CompactString::from(domain)
    }
}

/// Textual form of `record` with its volatile parts wiped.
///
/// TTL is always zeroed; for SOA records the serial and the timer fields are
/// zeroed as well. Two records that only differ in those fields produce the
/// same key and therefore overwrite each other in a bucket.
pub fn neutralize_record(record: &Record) -> CompactString {
    let mut neutral = match record.data() {
        RData::SOA(soa) => {
            let wiped = SOA::new(soa.mname().clone(), soa.rname().clone(), 0, 0, 0, 0, 0);
            let mut rebuilt = Record::from_rdata(record.name().clone(), 0, RData::SOA(wiped));
            rebuilt.set_dns_class(record.dns_class());
            rebuilt
        }
        _ => record.clone(),
    };
    neutral.set_ttl(0);
    CompactString::from(neutral.to_string())
}

/// Item key of a response snapshot: one slot per query type.
#[inline]
pub fn response_key(query_type: RecordType) -> CompactString {
    let mut key = CompactString::from(DNSSEC_DESIGNATION);
    key.push_str(&query_type.to_string());
    key
}
