//! Kernel error taxonomy.
//!
//! Fatal variants abort the run with a diagnostic naming the offending
//! envelope or registration; recoverable medium conditions never surface
//! here — they live in the air module's counters.

use thiserror::Error;

use wsim_core::{NodeId, SimTime, WsimError};
use wsim_event::{EnvelopeError, GeneratorKind};

#[derive(Debug, Error)]
pub enum KernelError {
    /// A polled envelope predates the clock.  Impossible unless a delay
    /// computation produced garbage, so the run aborts.
    #[error("clock moved backwards: {kind} envelope at {at} polled at {clock}")]
    ClockMovedBackwards {
        kind:  &'static str,
        at:    SimTime,
        clock: SimTime,
    },

    /// A generator manager returned a delay outside its contract.
    #[error("{kind} generator returned invalid next delay {delay}")]
    GeneratorContract { kind: GeneratorKind, delay: f64 },

    /// An envelope named a node the kernel does not know.
    #[error("envelope addressed to unknown node {0}")]
    UnknownNode(NodeId),

    /// Two managers registered for the same generator slot.
    #[error("two {0} generator managers registered")]
    DuplicateGenerator(GeneratorKind),

    /// The builder was not given a layer-stack factory.
    #[error("no layer-stack factory provided to the kernel builder")]
    MissingStackFactory,

    /// A scenario file row broke the sequential-id convention.
    #[error("scenario row {row}: expected node id {expected}, found {found}")]
    ScenarioOrder { row: usize, expected: u32, found: u32 },

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Air(#[from] wsim_air::AirError),

    #[error(transparent)]
    Core(#[from] WsimError),

    #[error("scenario file: {0}")]
    Scenario(#[from] csv::Error),
}

pub type KernelResult<T> = Result<T, KernelError>;
