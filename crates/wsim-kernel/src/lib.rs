//! `wsim-kernel` — the discrete-event execution core.
//!
//! # What lives here
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`kernel`]   | [`Kernel`]: clock, run loop, broadcast delivery           |
//! | [`builder`]  | [`KernelBuilder`] with setup-time validation              |
//! | [`node`]     | [`Node`]: layer stack + air module + position             |
//! | [`layer`]    | The [`Layer`] contract and [`LayerCtx`] action buffer     |
//! | [`generator`]| Movement/traffic/startup [`GeneratorManager`] contract    |
//! | [`observer`] | Write-only [`KernelObserver`] hooks                       |
//! | [`scenario`] | CSV node-placement loading                                |
//! | [`error`]    | [`KernelError`] taxonomy                                  |
//!
//! The kernel is single-threaded on purpose: determinism comes from the
//! (time, sequence) total order on envelope delivery, and a fixed seed
//! reproduces a run bit-exactly.

pub mod builder;
pub mod error;
pub mod generator;
pub mod kernel;
pub mod layer;
pub mod node;
pub mod observer;
pub mod scenario;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::KernelBuilder;
pub use error::{KernelError, KernelResult};
pub use generator::{GeneratorCtx, GeneratorDecision, GeneratorManager};
pub use kernel::{INIT_DELAY_SECS, Kernel, RunOutcome};
pub use layer::{Layer, LayerAction, LayerCtx};
pub use node::Node;
pub use observer::{KernelObserver, NoopObserver};
pub use scenario::{load_positions, read_positions};
