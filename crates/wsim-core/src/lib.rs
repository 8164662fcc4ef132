//! `wsim-core` — foundational types for the `rust_wsim` wireless simulator.
//!
//! This crate is a dependency of every other `wsim-*` crate.  It intentionally
//! has no `wsim-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`ids`]      | `NodeId`, `TransmissionId`                            |
//! | [`time`]     | `SimTime`, `Interval`                                 |
//! | [`position`] | `Position`, Euclidean distance                        |
//! | [`radio`]    | `RadioState` enum                                     |
//! | [`config`]   | `SimConfig`                                           |
//! | [`rng`]      | `NodeRng` (per-node), `SimRng` (global)               |
//! | [`error`]    | `WsimError`, `WsimResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod ids;
pub mod position;
pub mod radio;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::SimConfig;
pub use error::{WsimError, WsimResult};
pub use ids::{NodeId, TransmissionId};
pub use position::Position;
pub use radio::RadioState;
pub use rng::{NodeRng, SimRng};
pub use time::{Interval, SimTime};
