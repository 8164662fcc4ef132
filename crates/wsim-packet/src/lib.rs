//! `wsim-packet` — the data model of the shared wireless medium.
//!
//! # What lives here
//!
//! | Module           | Contents                                            |
//! |------------------|-----------------------------------------------------|
//! | [`packet`]       | Layered `Packet` chain, `ReceiverRecord`, `Address` |
//! | [`transmission`] | `Transmission`, `Reachability`                      |
//! | [`interference`] | `Interference`, `InterferenceQueue`                 |
//!
//! A `Packet` is a recursive encapsulation chain: each protocol layer wraps
//! the payload it received from above in its own header link.  Once a packet
//! is enclosed inside another it is write-protected for the rest of its life.
//!
//! A `Transmission` is one in-flight broadcast of an outermost packet; every
//! receiver works on an independent deep copy so per-receiver mutation can
//! never leak back to the sender.  An `Interference` is the effect of a
//! transmission at one specific non-intended receiver.

pub mod interference;
pub mod packet;
pub mod transmission;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use interference::{Interference, InterferenceQueue};
pub use packet::{
    Address, Direction, LayerKind, Packet, PacketDestination, PacketError, ReceiverHandle,
    ReceiverRecord,
};
pub use transmission::{Reachability, Transmission};
