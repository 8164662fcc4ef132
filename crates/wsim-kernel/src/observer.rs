//! Run observation hooks.
//!
//! Observers are write-only sinks the kernel notifies opportunistically;
//! nothing in the core contract depends on them.  Applications hang
//! progress reporting or tracing here.

use wsim_core::{NodeId, SimTime, TransmissionId};
use wsim_event::EventEnvelope;

use crate::kernel::RunOutcome;

pub trait KernelObserver {
    /// The clock advanced to `now` (called once per polled envelope).
    fn on_clock_advance(&mut self, now: SimTime) {
        let _ = now;
    }

    /// An envelope is about to be delivered.
    fn on_deliver(&mut self, envelope: &EventEnvelope) {
        let _ = envelope;
    }

    /// A transmission entered broadcast delivery.
    fn on_transmission(&mut self, sender: NodeId, id: TransmissionId) {
        let _ = (sender, id);
    }

    /// The run loop halted.
    fn on_halt(&mut self, outcome: RunOutcome) {
        let _ = outcome;
    }
}

/// The default observer: watches nothing.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl KernelObserver for NoopObserver {}
