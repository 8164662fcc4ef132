//! Self-rescheduling kernel generators.
//!
//! Movement, traffic, and node-startup work arrives through managers that
//! the kernel ticks via `GeneratorTick` envelopes.  After every tick the
//! manager answers with an explicit three-way decision — reschedule after a
//! delay, or stop — rather than a sentinel delay value; a negative or
//! non-finite delay is a contract violation and aborts the run.

use wsim_core::{SimConfig, SimTime};
use wsim_event::{Event, EventEnvelope, GeneratorKind, Recipient};

use crate::error::KernelResult;
use crate::node::Node;

/// What a manager wants after producing one round of work.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GeneratorDecision {
    /// Tick again after this many seconds (must be finite and ≥ 0).
    After(f64),
    /// No further work; the generator retires for the rest of the run.
    Stop,
}

/// Mutable view of the simulation a manager gets for one tick.
pub struct GeneratorCtx<'a> {
    pub now:    SimTime,
    pub config: &'a SimConfig,
    pub nodes:  &'a mut [Node],
    out: &'a mut Vec<EventEnvelope>,
}

impl<'a> GeneratorCtx<'a> {
    pub(crate) fn new(
        now:    SimTime,
        config: &'a SimConfig,
        nodes:  &'a mut [Node],
        out:    &'a mut Vec<EventEnvelope>,
    ) -> Self {
        Self { now, config, nodes, out }
    }

    /// Enqueue an arbitrary envelope `delay` seconds from now — the way a
    /// traffic manager injects packets into a node's stack.
    pub fn schedule(&mut self, delay: f64, recipient: Recipient, event: Event) -> KernelResult<()> {
        self.out.push(EventEnvelope::new(self.now, delay, recipient, event)?);
        Ok(())
    }
}

/// A movement/traffic/node-startup manager.
pub trait GeneratorManager {
    /// The tick slot this manager occupies; one manager per kind.
    fn kind(&self) -> GeneratorKind;

    /// Produce one round of work and decide when to tick next.
    fn produce(&mut self, ctx: &mut GeneratorCtx<'_>) -> KernelResult<GeneratorDecision>;
}
