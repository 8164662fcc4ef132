//! `wsim-air` — the per-node medium interface.
//!
//! One [`AirModule`] per node owns everything between the node's layer stack
//! and the shared medium: the half-duplex radio state machine, the single
//! outgoing transmission, the map of concurrently arriving transmissions,
//! the interference history, and both carrier-sense protocols.
//!
//! The module is deliberately kernel-agnostic: handlers return a list of
//! [`AirAction`]s (envelopes to schedule, packets to hand upward, a
//! transmission to broadcast, carrier-sense verdicts to deliver) and the
//! kernel turns those into queue operations.  That keeps the medium logic
//! testable without standing up a whole simulation.

pub mod air;

mod carrier_sense;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use air::{AirAction, AirCounters, AirCtx, AirError, AirModule, AirResult};
