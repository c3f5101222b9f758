use super::key::{neutralize_record, response_key};
use compact_str::CompactString;
use hickory_proto::op::Message;
use hickory_proto::rr::{Record, RecordType};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on the validity of a response snapshot whose records all
/// carry larger TTLs.
pub const MAX_RESPONSE_VALIDITY: Duration = Duration::from_secs(72 * 60 * 60);

/// Negative-caching metadata stored next to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordExtra {
    pub nxdomain: bool,
    pub nodata: bool,
    pub cname: bool,
    /// CNAME chain that led to the record.
    pub redirect: Vec<Record>,
}

/// Entry stored in a domain bucket.
///
/// The variant set is closed: a bucket holds either single resource records
/// or, for DNSSEC-validated lookups, whole responses so that signatures and
/// proofs stay bundled with the data they cover.
#[derive(Debug, Clone)]
pub enum CacheItem {
    Record(SingleRecord),
    Response(Box<ResponseSnapshot>),
}

impl CacheItem {
    pub fn record(record: Record, extra: Option<Arc<RecordExtra>>, now: Instant) -> Self {
        Self::Record(SingleRecord::new(record, extra, now))
    }

    /// `None` when the message has no question to file it under.
    pub fn response(message: Message, now: Instant) -> Option<Self> {
        ResponseSnapshot::new(message, now).map(|snapshot| Self::Response(Box::new(snapshot)))
    }

    #[inline]
    pub fn is_dnssec_store(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    #[inline]
    pub fn item_key(&self) -> &CompactString {
        match self {
            Self::Record(r) => &r.key,
            Self::Response(r) => &r.key,
        }
    }

    #[inline]
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::Record(r) => r.record.record_type(),
            Self::Response(r) => r.query_type,
        }
    }

    #[inline]
    pub fn time_created(&self) -> Instant {
        match self {
            Self::Record(r) => r.time_created,
            Self::Response(r) => r.time_created,
        }
    }

    #[inline]
    pub fn validity(&self) -> Duration {
        match self {
            Self::Record(r) => r.validity,
            Self::Response(r) => r.validity,
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.time_created() + self.validity()
    }

    #[inline]
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.time_created())
    }

    #[inline(always)]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.elapsed_at(now) >= self.validity()
    }

    /// Shifts the stored TTL(s) by `delta` seconds and recomputes validity.
    pub fn adjust_validity(&mut self, delta: i64) {
        match self {
            Self::Record(r) => r.adjust_validity(delta),
            Self::Response(r) => r.adjust_validity(delta),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SingleRecord {
    record: Record,
    key: CompactString,
    time_created: Instant,
    validity: Duration,
    extra: Option<Arc<RecordExtra>>,
}

impl SingleRecord {
    pub fn new(record: Record, extra: Option<Arc<RecordExtra>>, now: Instant) -> Self {
        let key = neutralize_record(&record);
        let validity = Duration::from_secs(u64::from(record.ttl()));
        Self {
            record,
            key,
            time_created: now,
            validity,
            extra,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn extra(&self) -> Option<&Arc<RecordExtra>> {
        self.extra.as_ref()
    }

    /// Copy of the record with its TTL reduced by the whole seconds elapsed
    /// since creation, or `None` once nothing is left.
    pub fn materialize(&self, now: Instant) -> Option<Record> {
        let elapsed = elapsed_secs(self.time_created, now);
        let ttl = self.record.ttl();
        if elapsed >= ttl {
            return None;
        }
        let mut copy = self.record.clone();
        copy.set_ttl(ttl - elapsed);
        Some(copy)
    }

    fn adjust_validity(&mut self, delta: i64) {
        let ttl = shift_ttl(self.record.ttl(), delta);
        self.record.set_ttl(ttl);
        self.validity = Duration::from_secs(u64::from(ttl));
    }
}

#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    message: Message,
    query_type: RecordType,
    key: CompactString,
    time_created: Instant,
    validity: Duration,
}

impl ResponseSnapshot {
    pub fn new(message: Message, now: Instant) -> Option<Self> {
        let query_type = message.queries().first()?.query_type();
        let validity = min_validity(&message);
        Some(Self {
            key: response_key(query_type),
            message,
            query_type,
            time_created: now,
            validity,
        })
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn query_type(&self) -> RecordType {
        self.query_type
    }

    /// Deep copy of the response with every TTL reduced by the elapsed whole
    /// seconds and the EDNS OPT pseudo-record dropped, whether it sits in
    /// the additional section or was lifted into the message extensions.
    ///
    /// Returns `None` when an answer record has run out of TTL: a partially
    /// expired answer is never handed out, the caller purges the entry.
    pub fn materialize(&self, now: Instant) -> Option<Message> {
        let elapsed = elapsed_secs(self.time_created, now);
        let mut copy = self.message.clone();
        *copy.extensions_mut() = None;

        let mut answers = copy.take_answers();
        for record in answers.iter_mut() {
            let ttl = record.ttl().saturating_sub(elapsed);
            if ttl == 0 {
                return None;
            }
            record.set_ttl(ttl);
        }

        let mut authorities = copy.take_name_servers();
        decrement_ttls(&mut authorities, elapsed);

        let mut additionals = copy.take_additionals();
        additionals.retain(|record| !is_meta(record));
        decrement_ttls(&mut additionals, elapsed);

        copy.insert_answers(answers);
        copy.insert_name_servers(authorities);
        copy.insert_additionals(additionals);
        Some(copy)
    }

    fn adjust_validity(&mut self, delta: i64) {
        let mut answers = self.message.take_answers();
        let mut authorities = self.message.take_name_servers();
        let mut additionals = self.message.take_additionals();
        for record in answers
            .iter_mut()
            .chain(authorities.iter_mut())
            .chain(additionals.iter_mut())
        {
            if !is_meta(record) {
                let ttl = shift_ttl(record.ttl(), delta);
                record.set_ttl(ttl);
            }
        }
        self.message.insert_answers(answers);
        self.message.insert_name_servers(authorities);
        self.message.insert_additionals(additionals);
        self.validity = min_validity(&self.message);
    }
}

/// True when any record of any section carries a zero TTL. OPT records
/// are skipped, their TTL field holds EDNS flags.
pub fn has_zero_ttl(message: &Message) -> bool {
    all_records(message).any(|record| record.ttl() == 0)
}

fn all_records(message: &Message) -> impl Iterator<Item = &Record> {
    message
        .answers()
        .iter()
        .chain(message.name_servers().iter())
        .chain(message.additionals().iter())
        .filter(|record| !is_meta(record))
}

#[inline]
fn is_meta(record: &Record) -> bool {
    record.record_type() == RecordType::OPT
}

fn min_validity(message: &Message) -> Duration {
    all_records(message)
        .map(|record| Duration::from_secs(u64::from(record.ttl())))
        .fold(MAX_RESPONSE_VALIDITY, Duration::min)
}

fn decrement_ttls(records: &mut [Record], elapsed: u32) {
    for record in records {
        let ttl = record.ttl().saturating_sub(elapsed);
        record.set_ttl(ttl);
    }
}

#[inline]
fn shift_ttl(ttl: u32, delta: i64) -> u32 {
    (i64::from(ttl) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

#[inline]
fn elapsed_secs(created: Instant, now: Instant) -> u32 {
    u32::try_from(now.saturating_duration_since(created).as_secs()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::op::{MessageType, OpCode, Query};
    use hickory_proto::op::Edns;
    use hickory_proto::rr::rdata::{A, OPT};
    use hickory_proto::rr::{Name, RData};
    use std::str::FromStr;

    fn name() -> Name {
        Name::from_str("example.com.").unwrap()
    }

    fn a_record(ttl: u32) -> Record {
        Record::from_rdata(name(), ttl, RData::A(A::new(1, 2, 3, 4)))
    }

    fn response(answer_ttls: &[u32], authority_ttls: &[u32]) -> Message {
        let mut message = Message::new(7, MessageType::Response, OpCode::Query);
        message.add_query(Query::query(name(), RecordType::A));
        for (i, ttl) in answer_ttls.iter().enumerate() {
            message.add_answer(Record::from_rdata(
                name(),
                *ttl,
                RData::A(A::new(10, 0, 0, i as u8 + 1)),
            ));
        }
        for ttl in authority_ttls {
            message.add_name_server(a_record(*ttl));
        }
        message
    }

    #[test]
    fn test_single_record_accessors() {
        let now = Instant::now();
        let item = CacheItem::record(a_record(10), None, now);

        assert!(!item.is_dnssec_store());
        assert_eq!(item.record_type(), RecordType::A);
        assert_eq!(item.time_created(), now);
        assert_eq!(item.validity(), Duration::from_secs(10));
        assert_eq!(item.expires_at(), now + Duration::from_secs(10));
    }

    #[test]
    fn test_single_record_materialize_decrements_ttl() {
        let now = Instant::now();
        let record = SingleRecord::new(a_record(10), None, now);

        let copy = record.materialize(now + Duration::from_secs(3)).unwrap();
        assert_eq!(copy.ttl(), 7);
        assert_eq!(record.record().ttl(), 10, "stored record must stay untouched");
    }

    #[test]
    fn test_single_record_materialize_rounds_down_elapsed() {
        let now = Instant::now();
        let record = SingleRecord::new(a_record(10), None, now);

        let copy = record.materialize(now + Duration::from_millis(2999)).unwrap();
        assert_eq!(copy.ttl(), 8);
    }

    #[test]
    fn test_single_record_materialize_after_expiry() {
        let now = Instant::now();
        let record = SingleRecord::new(a_record(10), None, now);

        assert!(record.materialize(now + Duration::from_secs(10)).is_none());
        assert!(record.materialize(now + Duration::from_secs(11)).is_none());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Instant::now();
        let item = CacheItem::record(a_record(10), None, now);

        assert!(!item.is_expired_at(now + Duration::from_millis(9999)));
        assert!(item.is_expired_at(now + Duration::from_secs(10)));
    }

    #[test]
    fn test_clock_before_creation_is_not_expired() {
        let now = Instant::now() + Duration::from_secs(5);
        let item = CacheItem::record(a_record(10), None, now);

        assert_eq!(item.elapsed_at(now - Duration::from_secs(5)), Duration::ZERO);
        assert!(!item.is_expired_at(now - Duration::from_secs(5)));
    }

    #[test]
    fn test_single_record_adjust_validity() {
        let now = Instant::now();
        let mut item = CacheItem::record(a_record(10), None, now);
        let key_before = item.item_key().clone();

        item.adjust_validity(-4);
        assert_eq!(item.validity(), Duration::from_secs(6));
        assert_eq!(item.item_key(), &key_before);

        item.adjust_validity(-100);
        assert_eq!(item.validity(), Duration::ZERO);
        assert!(item.is_expired_at(now));
    }

    #[test]
    fn test_snapshot_validity_is_min_ttl() {
        let now = Instant::now();
        let item = CacheItem::response(response(&[30, 60], &[45]), now).unwrap();

        assert!(item.is_dnssec_store());
        assert_eq!(item.validity(), Duration::from_secs(30));
        assert_eq!(item.record_type(), RecordType::A);
        assert_eq!(item.item_key(), "dnssec-A");
    }

    #[test]
    fn test_snapshot_validity_capped() {
        let now = Instant::now();
        let item = CacheItem::response(response(&[], &[]), now).unwrap();
        assert_eq!(item.validity(), MAX_RESPONSE_VALIDITY);

        let big = 80 * 60 * 60;
        let item = CacheItem::response(response(&[big], &[]), now).unwrap();
        assert_eq!(item.validity(), MAX_RESPONSE_VALIDITY);
    }

    #[test]
    fn test_snapshot_requires_question() {
        let message = Message::new(1, MessageType::Response, OpCode::Query);
        assert!(CacheItem::response(message, Instant::now()).is_none());
    }

    #[test]
    fn test_snapshot_materialize_decrements_all_sections() {
        let now = Instant::now();
        let snapshot = ResponseSnapshot::new(response(&[30, 60], &[45]), now).unwrap();

        let copy = snapshot.materialize(now + Duration::from_secs(10)).unwrap();
        let answer_ttls: Vec<u32> = copy.answers().iter().map(Record::ttl).collect();
        assert_eq!(answer_ttls, vec![20, 50]);
        assert_eq!(copy.name_servers()[0].ttl(), 35);
        assert_eq!(copy.queries().len(), 1);

        let stored: Vec<u32> = snapshot.message().answers().iter().map(Record::ttl).collect();
        assert_eq!(stored, vec![30, 60], "stored message must stay untouched");
    }

    #[test]
    fn test_snapshot_materialize_refuses_exhausted_answer() {
        let now = Instant::now();
        let snapshot = ResponseSnapshot::new(response(&[30, 60], &[]), now).unwrap();

        assert!(snapshot.materialize(now + Duration::from_secs(30)).is_none());
    }

    #[test]
    fn test_snapshot_adjust_validity_recomputes_min() {
        let now = Instant::now();
        let mut item = CacheItem::response(response(&[30, 60], &[45]), now).unwrap();

        item.adjust_validity(-10);
        assert_eq!(item.validity(), Duration::from_secs(20));

        item.adjust_validity(100);
        assert_eq!(item.validity(), Duration::from_secs(120));
    }

    #[test]
    fn test_has_zero_ttl() {
        assert!(!has_zero_ttl(&response(&[30], &[45])));
        assert!(has_zero_ttl(&response(&[30], &[0])));
        assert!(has_zero_ttl(&response(&[0, 30], &[])));
    }

    fn opt_record() -> Record {
        Record::from_rdata(Name::root(), 0, RData::OPT(OPT::default()))
    }

    #[test]
    fn test_opt_record_does_not_count_as_zero_ttl() {
        let mut message = response(&[30], &[]);
        message.add_additional(opt_record());

        assert!(!has_zero_ttl(&message));
        let item = CacheItem::response(message, Instant::now()).unwrap();
        assert_eq!(item.validity(), Duration::from_secs(30));
    }

    #[test]
    fn test_snapshot_materialize_strips_opt_keeps_additionals() {
        let now = Instant::now();
        let mut message = response(&[30], &[]);
        message.add_additional(opt_record());
        message.add_additional(a_record(45));
        let snapshot = ResponseSnapshot::new(message, now).unwrap();

        let copy = snapshot.materialize(now + Duration::from_secs(10)).unwrap();
        assert_eq!(copy.additionals().len(), 1);
        assert_eq!(copy.additionals()[0].record_type(), RecordType::A);
        assert_eq!(copy.additionals()[0].ttl(), 35);
        assert_eq!(snapshot.message().additionals().len(), 2);
    }

    #[test]
    fn test_snapshot_materialize_drops_edns() {
        let now = Instant::now();
        let mut message = response(&[30], &[]);
        message.set_edns(Edns::new());
        let snapshot = ResponseSnapshot::new(message, now).unwrap();

        let copy = snapshot.materialize(now).unwrap();
        assert!(copy.extensions().is_none());
        assert!(snapshot.message().extensions().is_some());
    }
}
