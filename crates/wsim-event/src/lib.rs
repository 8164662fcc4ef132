//! `wsim-event` — the schedulable event model and the deterministic queue.
//!
//! # What lives here
//!
//! | Module            | Contents                                           |
//! |-------------------|----------------------------------------------------|
//! | [`event`]         | Closed [`Event`] enum, [`Recipient`], [`GeneratorKind`] |
//! | [`envelope`]      | [`EventEnvelope`] (event + delivery time + sequence)    |
//! | [`queue`]         | [`EnvelopeQueue`] — (time, seq)-ordered min-heap        |
//! | [`carrier_sense`] | [`CarrierSenseInformation`], [`CarrierSenseOutcome`]    |
//!
//! # Determinism
//!
//! Delivery order is a total order over (time, enqueue sequence).  The queue
//! assigns sequence numbers at insertion, so for equal times the envelope
//! enqueued first is always polled first — the property every replay-exact
//! run depends on.

pub mod carrier_sense;
pub mod envelope;
pub mod event;
pub mod queue;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use carrier_sense::{CarrierSenseInformation, CarrierSenseOutcome};
pub use envelope::{EnvelopeError, EventEnvelope};
pub use event::{Event, GeneratorKind, Recipient};
pub use queue::EnvelopeQueue;
