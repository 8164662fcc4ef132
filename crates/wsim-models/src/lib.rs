//! `wsim-models` — the two pluggable oracles of the medium.
//!
//! The kernel and air module never compute propagation or bit errors
//! themselves; they consult these traits:
//!
//! - [`PhysicalModel`] — per-(sender, receiver) propagation verdict, queried
//!   once per pair per transmission by the broadcast loop.
//! - [`BitManglingModel`] — resolves a completed reception against the
//!   receiver's interference history.
//!
//! Stock implementations cover the common cases; applications swap in their
//! own at compile time, the same way a different routing algorithm would be
//! swapped into a road simulation.

pub mod mangling;
pub mod physical;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use mangling::{BitManglingModel, CollisionFreeMangling, SirThresholdMangling};
pub use physical::{LogDistanceModel, PhysicalModel, UnitDiskModel};
