use super::ticket::EvictionTicket;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Time-bucketed index of pending evictions.
///
/// Slots are `interval`-wide windows counted from `epoch`. `origin` is the
/// slot of the last sweep and is recomputed from the clock on every sweep,
/// so a late or skipped tick never leaves due tickets behind.
#[derive(Debug)]
pub struct EvictionIndex {
    epoch: Instant,
    interval: Duration,
    origin: u64,
    slots: BTreeMap<u64, Vec<EvictionTicket>>,
    len: usize,
}

impl EvictionIndex {
    pub fn new(interval: Duration, epoch: Instant) -> Self {
        Self {
            epoch,
            interval: interval.max(Duration::from_millis(1)),
            origin: 0,
            slots: BTreeMap::new(),
            len: 0,
        }
    }

    #[inline]
    fn slot_of(&self, at: Instant) -> u64 {
        let offset = at.saturating_duration_since(self.epoch).as_nanos();
        u64::try_from(offset / self.interval.as_nanos()).unwrap_or(u64::MAX)
    }

    pub fn schedule(&mut self, ticket: EvictionTicket) {
        let slot = self.slot_of(ticket.when);
        self.slots.entry(slot).or_default().push(ticket);
        self.len += 1;
    }

    /// Removes and returns every ticket whose slot lies entirely before
    /// `now`.
    pub fn due(&mut self, now: Instant) -> Vec<EvictionTicket> {
        self.origin = self.slot_of(now);
        let pending = self.slots.split_off(&self.origin);
        let due_slots = std::mem::replace(&mut self.slots, pending);

        let due: Vec<EvictionTicket> = due_slots.into_values().flatten().collect();
        self.len -= due.len();
        due
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
