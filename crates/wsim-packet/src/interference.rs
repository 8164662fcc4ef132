//! Interference records and the per-node interference history.
//!
//! # Why this exists
//!
//! Whether a reception decodes correctly depends on every signal that touched
//! the receiver while the packet was on the air — including signals that
//! ended before the packet did.  The air module therefore keeps an
//! append-only history of [`Interference`] records and hands it to the
//! bit-mangling model when a reception completes.
//!
//! The history is unbounded unless garbage-collected.  The collection rule is
//! owned by the caller: entries may only be purged up to a cutoff time `T`
//! such that no currently-open reception can still be affected by anything
//! that ended at or before `T`.  A completed *valid* reception proves exactly
//! that for `T = now`, which is when the air module collects.
//!
//! # Performance note
//!
//! Entries are kept sorted by (start, duration, id) with binary-search
//! insertion.  Histories are short in practice (GC after every valid
//! reception), so the O(n) insertion shift is irrelevant.

use std::cmp::Ordering;

use wsim_core::{Interval, NodeId, SimTime};

use crate::{Reachability, Transmission};

// ── Interference ──────────────────────────────────────────────────────────────

/// A transmission's effect at one specific receiving node: detectable,
/// relevant to bit-error computation, but not necessarily decodable.
///
/// Created once per (sender-transmission, receiver) pair when the propagation
/// model deems the signal non-negligible.
#[derive(Debug)]
pub struct Interference {
    pub receiver:     NodeId,
    pub transmission: Transmission,
    pub reachability: Reachability,
}

impl Interference {
    pub fn new(receiver: NodeId, transmission: Transmission, reachability: Reachability) -> Self {
        Self { receiver, transmission, reachability }
    }

    /// The span during which this signal is present at the receiver.
    #[inline]
    pub fn interval(&self) -> &Interval {
        &self.transmission.interval
    }

    #[inline]
    pub fn end(&self) -> SimTime {
        self.transmission.end()
    }

    /// Ordering key: (start, duration, transmission id).  The id breaks ties
    /// so ordering is total and stable across runs.
    fn key(&self) -> (SimTime, f64, u64) {
        (
            self.transmission.interval.start,
            self.transmission.interval.duration,
            self.transmission.id.0,
        )
    }
}

impl PartialEq for Interference {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Interference {}

impl PartialOrd for Interference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interference {
    fn cmp(&self, other: &Self) -> Ordering {
        let (s1, d1, i1) = self.key();
        let (s2, d2, i2) = other.key();
        s1.cmp(&s2)
            .then(d1.total_cmp(&d2))
            .then(i1.cmp(&i2))
    }
}

// ── InterferenceQueue ─────────────────────────────────────────────────────────

/// Ordered, append-only history of interference at one node.
#[derive(Debug, Default)]
pub struct InterferenceQueue {
    entries: Vec<Interference>,
}

impl InterferenceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record at its sorted position.
    pub fn add(&mut self, interference: Interference) {
        let at = self
            .entries
            .binary_search(&interference)
            .unwrap_or_else(|i| i);
        self.entries.insert(at, interference);
    }

    /// All records, ordered by (start, duration, id).
    pub fn iter(&self) -> impl Iterator<Item = &Interference> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` if any recorded signal is present at instant `t`.
    pub fn any_overlapping(&self, t: SimTime) -> bool {
        self.entries
            .iter()
            .any(|i| i.interval().contains(t))
    }

    /// `true` if any recorded signal shares an instant with `window`.
    pub fn any_intersecting(&self, window: &Interval) -> bool {
        self.entries
            .iter()
            .any(|i| i.interval().intersects(window))
    }

    /// The latest end among signals present at instant `t`, or `None` if the
    /// medium is clear of recorded interference at `t`.  Negative
    /// carrier-sense checks reschedule themselves for this instant.
    pub fn busy_until(&self, t: SimTime) -> Option<SimTime> {
        self.entries
            .iter()
            .filter(|i| i.interval().contains(t))
            .map(Interference::end)
            .max()
    }

    /// Purge records that ended at or before `cutoff`.
    ///
    /// The caller asserts the cutoff is safe: no currently-open reception can
    /// still be affected by anything that ended by then.  Records still
    /// running at the cutoff are always retained.  Returns the number of
    /// records removed.
    pub fn garbage_collect(&mut self, cutoff: SimTime) -> usize {
        let before = self.entries.len();
        self.entries.retain(|i| i.end() > cutoff);
        before - self.entries.len()
    }
}
