//! Simulation time model.
//!
//! # Design
//!
//! Time is a continuous `f64` second count from simulation start, wrapped in
//! `SimTime`.  Propagation delays and packet airtimes are sub-millisecond
//! reals, so an integer tick would force a unit choice on every model; a
//! double covers ~285 years at nanosecond granularity before precision decays
//! below 1 ns, far beyond any conceivable run.
//!
//! `SimTime` implements full `Ord` via `f64::total_cmp` so it can key the
//! envelope heap directly.  NaN never enters the system: every delay is
//! validated non-negative at envelope construction.
//!
//! `Interval` is the half-open span `[start, start + duration)` used for
//! arrival tracking, interference records, and carrier-sense windows.

use std::cmp::Ordering;
use std::fmt;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulation timestamp in seconds from simulation start.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// The timestamp `delta` seconds after `self`.
    #[inline]
    pub fn after(self, delta: f64) -> SimTime {
        SimTime(self.0 + delta)
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }

    #[inline]
    pub fn secs(self) -> f64 {
        self.0
    }
}

impl PartialEq for SimTime {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.0)
    }
}

// ── Interval ──────────────────────────────────────────────────────────────────

/// A half-open time span `[start, start + duration)`.
///
/// Zero-duration intervals are legal and intersect nothing, including
/// themselves.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    pub start:    SimTime,
    pub duration: f64,
}

impl Interval {
    /// Create an interval.  `duration` must be non-negative.
    #[inline]
    pub fn new(start: SimTime, duration: f64) -> Self {
        debug_assert!(duration >= 0.0, "negative interval duration {duration}");
        Self { start, duration }
    }

    /// The exclusive end of the span.
    #[inline]
    pub fn end(&self) -> SimTime {
        self.start.after(self.duration)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.duration == 0.0
    }

    /// `true` if `t` lies inside the half-open span.
    #[inline]
    pub fn contains(&self, t: SimTime) -> bool {
        self.start <= t && t < self.end()
    }

    /// `true` if the two half-open spans share at least one instant.
    #[inline]
    pub fn intersects(&self, other: &Interval) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// The smallest interval covering both spans.
    ///
    /// Used to maintain the "last incoming" / "last interference" tracking
    /// spans, where only the covering envelope matters, not the gaps.
    pub fn merge(&self, other: &Interval) -> Interval {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Interval::new(start, end.since(start))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}
