//! One simulated node: identity, position, layer stack, air module.

use wsim_air::AirModule;
use wsim_core::{NodeId, NodeRng, Position, SimTime};
use wsim_event::Event;
use wsim_packet::LayerKind;

use crate::layer::{Layer, LayerAction, LayerCtx};

/// A node is created once at setup and never destroyed; it can only be
/// suspended (stops participating in deliveries and broadcasts) or powered
/// down at the radio level.
pub struct Node {
    pub id:        NodeId,
    pub position:  Position,
    pub air:       AirModule,
    pub suspended: bool,
    pub(crate) stack: Vec<Box<dyn Layer>>,
    rng: NodeRng,
}

impl Node {
    pub fn new(id: NodeId, position: Position, stack: Vec<Box<dyn Layer>>, global_seed: u64) -> Self {
        Self {
            id,
            position,
            air: AirModule::new(id),
            suspended: false,
            stack,
            rng: NodeRng::new(global_seed, id),
        }
    }

    /// Stop participating in deliveries and broadcasts.  Envelopes addressed
    /// to a suspended node are dropped, not queued.
    #[inline]
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    #[inline]
    pub fn resume(&mut self) {
        self.suspended = false;
    }

    /// Power the radio down; the layer stack keeps running on timers.
    #[inline]
    pub fn power_down(&mut self) {
        self.air.power_off();
    }

    #[inline]
    pub fn power_up(&mut self) {
        self.air.power_on();
    }

    /// Number of layers, bottom (medium side) to top (application side).
    #[inline]
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Stack slot of the first layer identifying as `kind`.
    pub fn layer_index(&self, kind: LayerKind) -> Option<usize> {
        self.stack.iter().position(|l| l.kind() == kind)
    }

    pub fn layer_kind_at(&self, at: usize) -> Option<LayerKind> {
        self.stack.get(at).map(|l| l.kind())
    }

    /// Deliver one event to the layer in slot `at`; returns the layer's kind
    /// and the actions it requested.
    pub(crate) fn run_layer(
        &mut self,
        at:    usize,
        now:   SimTime,
        event: Event,
    ) -> (LayerKind, Vec<LayerAction>) {
        let mut ctx = LayerCtx::new(now, self.id, &mut self.rng);
        self.stack[at].process_event(event, &mut ctx);
        (self.stack[at].kind(), ctx.into_actions())
    }
}
