//! `EnvelopeQueue` — the deterministic (time, sequence) priority queue.
//!
//! # Why this exists
//!
//! A plain time-keyed heap leaves the order of equal-time entries up to the
//! heap's internal structure, which varies across implementations and even
//! across insert orders.  Bit-exact replay requires a *stable* tie-break:
//! for equal delivery times, the envelope enqueued first is polled first.
//!
//! The queue therefore stamps every envelope with a monotonically increasing
//! sequence number at insertion and orders the heap by the composite key
//! (time, sequence).  Nothing outside this module may observe or depend on
//! the heap's internal structure beyond that key.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use wsim_core::SimTime;

use crate::EventEnvelope;

// ── Heap entry ────────────────────────────────────────────────────────────────

/// Newtype flipping the comparison so `BinaryHeap` (a max-heap) pops the
/// smallest (time, seq) first.
struct MinEntry(EventEnvelope);

impl PartialEq for MinEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MinEntry {}

impl PartialOrd for MinEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MinEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the heap's "greatest" entry is the earliest envelope.
        other
            .0
            .time()
            .cmp(&self.0.time())
            .then(other.0.seq.cmp(&self.0.seq))
    }
}

// ── EnvelopeQueue ─────────────────────────────────────────────────────────────

/// Min-heap of envelopes keyed by (delivery time, enqueue sequence).
#[derive(Default)]
pub struct EnvelopeQueue {
    heap:     BinaryHeap<MinEntry>,
    next_seq: u64,
}

impl EnvelopeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an envelope, assigning it the next sequence number.
    ///
    /// Sequence numbers start at 0, increase monotonically, and are never
    /// reused for the lifetime of the queue.
    pub fn add(&mut self, mut envelope: EventEnvelope) {
        envelope.seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(MinEntry(envelope));
    }

    /// Remove and return the minimum envelope, or `None` when empty.
    /// Never blocks.
    pub fn poll(&mut self) -> Option<EventEnvelope> {
        self.heap.pop().map(|e| e.0)
    }

    /// The delivery time of the next envelope without removing it.
    pub fn next_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|e| e.0.time())
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Total envelopes ever enqueued (equals the next sequence number).
    pub fn enqueued_total(&self) -> u64 {
        self.next_seq
    }
}
