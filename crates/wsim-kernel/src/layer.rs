//! The protocol-layer contract.
//!
//! The kernel never inspects layer internals: a layer is anything that
//! implements [`Layer`] and reacts to delivered events by pushing
//! [`LayerAction`]s into the supplied [`LayerCtx`].  Packet events are
//! dispatched to `upper_sap`/`lower_sap` by travel direction; everything
//! else lands in the wake-up style callbacks.

use log::debug;

use wsim_core::{NodeId, NodeRng, SimTime};
use wsim_event::{CarrierSenseOutcome, Event};
use wsim_packet::{Direction, LayerKind, Packet};

// ── Actions ───────────────────────────────────────────────────────────────────

/// Side effects a layer requests during one event delivery.  Applied by the
/// kernel, in order, within the same tick.
#[derive(Debug)]
pub enum LayerAction {
    /// Deliver a `WakeUp { tag }` back to this layer after `delay` seconds.
    ScheduleWakeUp { delay: f64, tag: u64 },

    /// Hand a packet to the adjacent layer: downward-travelling packets go
    /// one layer towards the medium, upward-travelling ones towards the
    /// application.
    Forward(Packet),

    /// Put a packet on the air through the node's air module.  `expected`
    /// lists the nodes whose failure to receive is worth a warning.
    Transmit {
        packet:     Packet,
        signal_dbm: f64,
        expected:   Vec<NodeId>,
    },

    /// Start a legacy two-phase carrier sense; the verdict comes back as a
    /// `CarrierSenseResult` event.
    PerformCarrierSense {
        min_free_secs: f64,
        var_free_secs: f64,
    },

    /// Register a generic carrier sense; the verdict comes back as a
    /// `CarrierSenseResult` event.
    RegisterCarrierSense {
        duration_secs: f64,
        negative:      bool,
        virtual_sense: bool,
    },
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Per-delivery context handed to a layer: the clock, the node identity, the
/// node's private RNG, and the action buffer.
pub struct LayerCtx<'a> {
    pub now:  SimTime,
    pub node: NodeId,
    pub rng:  &'a mut NodeRng,
    actions:  Vec<LayerAction>,
}

impl<'a> LayerCtx<'a> {
    pub(crate) fn new(now: SimTime, node: NodeId, rng: &'a mut NodeRng) -> Self {
        Self { now, node, rng, actions: Vec::new() }
    }

    pub(crate) fn into_actions(self) -> Vec<LayerAction> {
        self.actions
    }

    pub fn schedule_wake_up(&mut self, delay: f64, tag: u64) {
        self.actions.push(LayerAction::ScheduleWakeUp { delay, tag });
    }

    pub fn forward(&mut self, packet: Packet) {
        self.actions.push(LayerAction::Forward(packet));
    }

    pub fn transmit(&mut self, packet: Packet, signal_dbm: f64, expected: Vec<NodeId>) {
        self.actions.push(LayerAction::Transmit { packet, signal_dbm, expected });
    }

    pub fn perform_carrier_sense(&mut self, min_free_secs: f64, var_free_secs: f64) {
        self.actions.push(LayerAction::PerformCarrierSense { min_free_secs, var_free_secs });
    }

    pub fn register_carrier_sense(&mut self, duration_secs: f64, negative: bool, virtual_sense: bool) {
        self.actions.push(LayerAction::RegisterCarrierSense {
            duration_secs,
            negative,
            virtual_sense,
        });
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// One protocol layer in a node's stack.
///
/// Implement the specific callbacks; `process_event` provides the standard
/// dispatch and rarely needs overriding.
pub trait Layer {
    /// Which stack slot this layer identifies as.
    fn kind(&self) -> LayerKind;

    /// Delivered once, shortly after simulation start.
    fn initialize(&mut self, ctx: &mut LayerCtx<'_>) {
        let _ = ctx;
    }

    /// A packet arriving from the layer above (travelling downward).
    fn upper_sap(&mut self, packet: Packet, ctx: &mut LayerCtx<'_>);

    /// A packet arriving from the layer below (travelling upward).
    fn lower_sap(&mut self, packet: Packet, ctx: &mut LayerCtx<'_>);

    /// A timer scheduled earlier via [`LayerCtx::schedule_wake_up`].
    fn process_wake_up(&mut self, tag: u64, ctx: &mut LayerCtx<'_>) {
        let _ = (tag, ctx);
    }

    /// Resolution of a carrier-sense request this layer registered.
    fn carrier_sense_result(&mut self, outcome: CarrierSenseOutcome, ctx: &mut LayerCtx<'_>) {
        let _ = (outcome, ctx);
    }

    /// Standard event dispatch.  Unknown event kinds are reported and
    /// dropped; they never stop the run.
    fn process_event(&mut self, event: Event, ctx: &mut LayerCtx<'_>) {
        match event {
            Event::Packet(packet) => match packet.direction() {
                Direction::Downward => self.upper_sap(packet, ctx),
                Direction::Upward   => self.lower_sap(packet, ctx),
            },
            Event::Initialize => self.initialize(ctx),
            Event::WakeUp { tag } => self.process_wake_up(tag, ctx),
            Event::CarrierSenseResult { outcome } => self.carrier_sense_result(outcome, ctx),
            other => {
                debug!(
                    "node {}: {} layer dropped unhandled {} event",
                    ctx.node,
                    self.kind(),
                    other.kind_name()
                );
            }
        }
    }
}
