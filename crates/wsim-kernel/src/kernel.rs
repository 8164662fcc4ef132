//! The simulation kernel: clock, run loop, and broadcast delivery.
//!
//! # Run loop
//!
//! Two phases.  *Setup* enqueues an `Initialize` envelope per node at a
//! small fixed delay plus the first tick of every generator manager.  *Run*
//! then loops: poll the queue (empty → halt with a warning), refuse a clock
//! regression fatally, advance the clock, halt normally past the horizon,
//! and deliver.  Every delivery runs to completion before the next poll —
//! "concurrency" exists only as overlapping intervals in the data.
//!
//! # Broadcast delivery
//!
//! One transmission is fanned out with an all-pairs scan: every other node
//! gets a propagation verdict from the physical model.  Interfering signals
//! are delivered synchronously in the same tick (their record must be
//! visible to any later same-tick event); reachable ones are scheduled as
//! `TransmissionReached` envelopes.  The scan is O(n) per transmission by
//! design — the physical model is the only pluggable scaling point.

use log::{debug, info, warn};

use wsim_air::{AirAction, AirCtx};
use wsim_core::{NodeId, SimConfig, SimRng, SimTime};
use wsim_event::{
    CarrierSenseInformation, EnvelopeQueue, Event, EventEnvelope, GeneratorKind, Recipient,
};
use wsim_models::{BitManglingModel, PhysicalModel};
use wsim_packet::{Address, Direction, Interference, LayerKind, Transmission};

use crate::error::{KernelError, KernelResult};
use crate::generator::{GeneratorCtx, GeneratorDecision, GeneratorManager};
use crate::layer::LayerAction;
use crate::node::Node;
use crate::observer::KernelObserver;

/// Delay before each node's `Initialize` delivery at simulation start.
pub const INIT_DELAY_SECS: f64 = 1e-3;

/// How a run ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The clock passed the configured horizon; the normal ending.
    HorizonReached,
    /// The queue ran dry before the horizon — usually a sign the scenario
    /// stopped generating work earlier than intended.
    QueueExhausted,
}

// ── Kernel ────────────────────────────────────────────────────────────────────

/// The simulation context: explicit, constructed once, and passed by
/// reference to everything that needs clock access or broadcast delivery.
pub struct Kernel<P, B> {
    pub(crate) config: SimConfig,
    pub(crate) clock:  SimTime,
    pub(crate) queue:  EnvelopeQueue,
    pub(crate) nodes:  Vec<Node>,
    physical: P,
    mangling: B,
    managers: Vec<Box<dyn GeneratorManager>>,
    observer: Box<dyn KernelObserver>,
    rng: SimRng,
    delivered: u64,
    started: bool,
}

impl<P: PhysicalModel, B: BitManglingModel> Kernel<P, B> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config:   SimConfig,
        nodes:    Vec<Node>,
        physical: P,
        mangling: B,
        managers: Vec<Box<dyn GeneratorManager>>,
        observer: Box<dyn KernelObserver>,
    ) -> Self {
        let rng = SimRng::new(config.seed);
        Self {
            config,
            clock: SimTime::ZERO,
            queue: EnvelopeQueue::new(),
            nodes,
            physical,
            mangling,
            managers,
            observer,
            rng,
            delivered: 0,
            started: false,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> SimTime {
        self.clock
    }

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Envelopes delivered so far.
    #[inline]
    pub fn delivered_total(&self) -> u64 {
        self.delivered
    }

    fn node_index(&self, id: NodeId) -> KernelResult<usize> {
        // Node ids are assigned sequentially by the builder.
        let idx = id.index();
        if idx < self.nodes.len() {
            Ok(idx)
        } else {
            Err(KernelError::UnknownNode(id))
        }
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    /// Enqueue `event` for delivery `delay` seconds from now.
    pub fn schedule(&mut self, delay: f64, recipient: Recipient, event: Event) -> KernelResult<()> {
        let envelope = EventEnvelope::new(self.clock, delay, recipient, event)?;
        self.queue.add(envelope);
        Ok(())
    }

    // ── Run loop ──────────────────────────────────────────────────────────

    /// Run the simulation to its horizon (or until the queue drains).
    pub fn run(&mut self) -> KernelResult<RunOutcome> {
        if !self.started {
            self.setup()?;
            self.started = true;
        }
        let outcome = self.run_loop()?;
        self.observer.on_halt(outcome);
        match outcome {
            RunOutcome::HorizonReached => info!(
                "horizon {}s reached after {} deliveries",
                self.config.horizon_secs, self.delivered
            ),
            RunOutcome::QueueExhausted => {
                warn!("event queue exhausted at {} after {} deliveries", self.clock, self.delivered);
            }
        }
        Ok(outcome)
    }

    fn setup(&mut self) -> KernelResult<()> {
        info!(
            "starting run: {} nodes, horizon {}s, seed {}",
            self.nodes.len(),
            self.config.horizon_secs,
            self.config.seed
        );
        for i in 0..self.nodes.len() {
            let node = self.nodes[i].id;
            self.schedule(INIT_DELAY_SECS, Recipient::Stack(node), Event::Initialize)?;
        }
        let kinds: Vec<GeneratorKind> = self.managers.iter().map(|m| m.kind()).collect();
        for kind in kinds {
            self.schedule(0.0, Recipient::Generator(kind), Event::GeneratorTick(kind))?;
        }
        Ok(())
    }

    fn run_loop(&mut self) -> KernelResult<RunOutcome> {
        loop {
            let Some(envelope) = self.queue.poll() else {
                return Ok(RunOutcome::QueueExhausted);
            };
            if envelope.time() < self.clock {
                return Err(KernelError::ClockMovedBackwards {
                    kind:  envelope.event.kind_name(),
                    at:    envelope.time(),
                    clock: self.clock,
                });
            }
            self.clock = envelope.time();
            self.observer.on_clock_advance(self.clock);
            if self.clock.secs() > self.config.horizon_secs {
                return Ok(RunOutcome::HorizonReached);
            }
            self.deliver(envelope)?;
        }
    }

    // ── Delivery ──────────────────────────────────────────────────────────

    fn deliver(&mut self, envelope: EventEnvelope) -> KernelResult<()> {
        self.observer.on_deliver(&envelope);
        self.delivered += 1;
        let recipient = envelope.recipient;
        let event = envelope.event;

        if let Some(node) = recipient.node() {
            let idx = self.node_index(node)?;
            if self.nodes[idx].suspended {
                debug!("node {node}: suspended, {} event dropped", event.kind_name());
                return Ok(());
            }
        }

        match recipient {
            Recipient::Air(node) => {
                let idx = self.node_index(node)?;
                let actions = {
                    let ctx = AirCtx {
                        now: self.clock,
                        propagation_delay_secs: self.config.propagation_delay_secs,
                        mangling: &self.mangling,
                    };
                    self.nodes[idx].air.handle(&ctx, event)?
                };
                self.apply_air_actions(idx, actions)
            }
            Recipient::Stack(node) => self.deliver_to_stack(node, event),
            Recipient::Layer(addr) => {
                let idx = self.node_index(addr.node)?;
                let Some(at) = self.nodes[idx].layer_index(addr.layer) else {
                    warn!("node {} has no {} layer, event dropped", addr.node, addr.layer);
                    return Ok(());
                };
                self.deliver_to_layer(idx, at, event)
            }
            Recipient::Generator(kind) => self.tick_generator(kind),
        }
    }

    fn deliver_to_stack(&mut self, node: NodeId, event: Event) -> KernelResult<()> {
        let idx = self.node_index(node)?;
        if self.nodes[idx].stack_len() == 0 {
            debug!("node {node}: empty stack, {} event dropped", event.kind_name());
            return Ok(());
        }
        match event {
            Event::Initialize => {
                for at in 0..self.nodes[idx].stack_len() {
                    self.deliver_to_layer(idx, at, Event::Initialize)?;
                }
                Ok(())
            }
            // A packet entering the whole stack starts at the edge its
            // direction points away from.
            Event::Packet(packet) => {
                let at = match packet.direction() {
                    Direction::Upward   => 0,
                    Direction::Downward => self.nodes[idx].stack_len() - 1,
                };
                self.deliver_to_layer(idx, at, Event::Packet(packet))
            }
            other => {
                warn!("node {node}: stack envelope carried {}, dropped", other.kind_name());
                Ok(())
            }
        }
    }

    fn deliver_to_layer(&mut self, idx: usize, at: usize, event: Event) -> KernelResult<()> {
        let (layer, actions) = self.nodes[idx].run_layer(at, self.clock, event);
        self.apply_layer_actions(idx, at, layer, actions)
    }

    fn apply_layer_actions(
        &mut self,
        idx:     usize,
        at:      usize,
        layer:   LayerKind,
        actions: Vec<LayerAction>,
    ) -> KernelResult<()> {
        let node = self.nodes[idx].id;
        let registrant = Address::new(node, layer);
        for action in actions {
            match action {
                LayerAction::ScheduleWakeUp { delay, tag } => {
                    self.schedule(delay, Recipient::Layer(registrant), Event::WakeUp { tag })?;
                }
                LayerAction::Forward(packet) => {
                    let next = match packet.direction() {
                        Direction::Upward if at + 1 < self.nodes[idx].stack_len() => Some(at + 1),
                        Direction::Downward if at > 0 => Some(at - 1),
                        _ => None,
                    };
                    match next.and_then(|n| self.nodes[idx].layer_kind_at(n)) {
                        Some(kind) => {
                            self.schedule(
                                0.0,
                                Recipient::Layer(Address::new(node, kind)),
                                Event::Packet(packet),
                            )?;
                        }
                        None => {
                            debug!(
                                "node {node}: packet forwarded off the {} end of the stack, dropped",
                                match packet.direction() {
                                    Direction::Upward   => "top",
                                    Direction::Downward => "bottom",
                                }
                            );
                        }
                    }
                }
                LayerAction::Transmit { packet, signal_dbm, expected } => {
                    let (ok, air_actions) =
                        self.nodes[idx].air.transmit(self.clock, packet, signal_dbm, expected);
                    if ok {
                        self.apply_air_actions(idx, air_actions)?;
                    }
                }
                LayerAction::PerformCarrierSense { min_free_secs, var_free_secs } => {
                    let air_actions = self.nodes[idx].air.perform_carrier_sense(
                        registrant,
                        min_free_secs,
                        var_free_secs,
                    );
                    self.apply_air_actions(idx, air_actions)?;
                }
                LayerAction::RegisterCarrierSense { duration_secs, negative, virtual_sense } => {
                    let info = CarrierSenseInformation {
                        id: 0, // assigned by the air module at registration
                        registrant,
                        duration_secs,
                        negative,
                        virtual_sense,
                    };
                    self.schedule(
                        0.0,
                        Recipient::Air(node),
                        Event::CarrierSenseRegistration(info),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn apply_air_actions(&mut self, idx: usize, actions: Vec<AirAction>) -> KernelResult<()> {
        let node = self.nodes[idx].id;
        for action in actions {
            match action {
                AirAction::Schedule { delay, event } => {
                    self.schedule(delay, Recipient::Air(node), event)?;
                }
                AirAction::DeliverUp(packet) => match self.nodes[idx].layer_kind_at(0) {
                    Some(bottom) => {
                        self.schedule(
                            0.0,
                            Recipient::Layer(Address::new(node, bottom)),
                            Event::Packet(packet),
                        )?;
                    }
                    None => debug!("node {node}: no layers to receive a decoded packet"),
                },
                AirAction::Broadcast(tx) => self.broadcast_transmission(idx, tx)?,
                AirAction::Notify { registrant, outcome } => {
                    self.schedule(
                        0.0,
                        Recipient::Layer(registrant),
                        Event::CarrierSenseResult { outcome },
                    )?;
                }
            }
        }
        Ok(())
    }

    /// All-pairs fan-out of one transmission (§ module docs).
    fn broadcast_transmission(
        &mut self,
        sender: usize,
        tx:     Transmission,
    ) -> KernelResult<()> {
        let sender_id = self.nodes[sender].id;
        let sender_pos = self.nodes[sender].position;
        // From here on, "time" means "when the signal begins reaching a
        // receiver".
        let arrival_start = self.clock.after(self.config.propagation_delay_secs);
        self.observer.on_transmission(sender_id, tx.id);

        for i in 0..self.nodes.len() {
            if i == sender || self.nodes[i].suspended {
                continue;
            }
            let receiver_pos = self.nodes[i].position;
            let verdict =
                self.physical.reachability(receiver_pos, sender_pos, tx.signal_dbm, &mut self.rng);

            // The flags are independent: both may fire for the same pair.
            if verdict.interfering {
                // Synchronous, same tick — the record must be visible to
                // any later event at this timestamp.
                let record =
                    Interference::new(self.nodes[i].id, tx.receiver_copy_at(arrival_start), verdict);
                let actions = {
                    let ctx = AirCtx {
                        now: self.clock,
                        propagation_delay_secs: self.config.propagation_delay_secs,
                        mangling: &self.mangling,
                    };
                    self.nodes[i].air.handle(&ctx, Event::Interference(record))?
                };
                self.apply_air_actions(i, actions)?;
            }
            if verdict.reachable {
                let copy = tx.receiver_copy_at(arrival_start);
                self.schedule(
                    0.0,
                    Recipient::Air(self.nodes[i].id),
                    Event::TransmissionReached { transmission: copy, arrival: verdict },
                )?;
            }
        }
        Ok(())
    }

    // ── Generators ────────────────────────────────────────────────────────

    fn tick_generator(&mut self, kind: GeneratorKind) -> KernelResult<()> {
        let Some(slot) = self.managers.iter().position(|m| m.kind() == kind) else {
            debug!("{kind} generator tick with no manager registered, dropped");
            return Ok(());
        };
        // Take the manager out of its slot so it can borrow the rest of the
        // kernel mutably for the tick.
        let mut manager = self.managers.swap_remove(slot);
        let mut produced = Vec::new();
        let decision = {
            let mut ctx =
                GeneratorCtx::new(self.clock, &self.config, &mut self.nodes, &mut produced);
            manager.produce(&mut ctx)
        };
        self.managers.push(manager);
        for envelope in produced {
            self.queue.add(envelope);
        }

        match decision? {
            GeneratorDecision::After(delay) if delay.is_finite() && delay >= 0.0 => {
                self.schedule(delay, Recipient::Generator(kind), Event::GeneratorTick(kind))
            }
            GeneratorDecision::After(delay) => Err(KernelError::GeneratorContract { kind, delay }),
            GeneratorDecision::Stop => {
                info!("{kind} generator stopped at {}", self.clock);
                Ok(())
            }
        }
    }
}
