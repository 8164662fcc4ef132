//! The air module: radio state machine and transmission/interference
//! handling for one node.
//!
//! # Delivery timeline of one broadcast
//!
//! ```text
//! t (send)        TransmissionReached delivered, Interference recorded
//! t + d           TransmissionBeginIncoming — reception opens
//! t + d + D       TransmissionEndIncoming — mangling model decides
//! ```
//!
//! where `d` is the one-way propagation delay and `D` the packet airtime.
//! The sender's own module sees `TransmissionEndOutgoing` at `t + D`.
//!
//! Same-timestamp events are only ordered by enqueue sequence, so every
//! mutation a handler performs must be complete before it returns; there is
//! no isolation between events in the same tick.

use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use wsim_core::{Interval, NodeId, RadioState, SimTime, TransmissionId};
use wsim_event::{CarrierSenseInformation, CarrierSenseOutcome, Event};
use wsim_models::BitManglingModel;
use wsim_packet::{Address, Interference, InterferenceQueue, Packet, Reachability, Transmission};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Fatal air-module failures.  Both variants indicate an internal invariant
/// violation, not a recoverable protocol condition; the kernel aborts the run.
#[derive(Debug, Error)]
pub enum AirError {
    /// A physical (non-virtual) negative carrier sense was found pending
    /// while the node is sending.  Unreachable through the documented
    /// registration rules, so hitting it means a bookkeeping bug.
    #[error("node {node}: physical negative carrier sense {cs_id} pending while sending")]
    NegativeSenseWhileSending { node: NodeId, cs_id: u64 },

    /// An event kind the air module does not consume was routed to it.
    #[error("node {node}: air module cannot handle {kind} events")]
    UnexpectedEvent { node: NodeId, kind: &'static str },
}

pub type AirResult<T> = Result<T, AirError>;

// ── Actions ───────────────────────────────────────────────────────────────────

/// What a handler wants the kernel to do on the module's behalf.
///
/// Actions are applied by the kernel in the order returned, all within the
/// same tick as the triggering event.
#[derive(Debug)]
pub enum AirAction {
    /// Enqueue `event` back to this node's air module after `delay` seconds.
    Schedule { delay: f64, event: Event },
    /// Hand a decoded, direction-flipped packet to the node's layer stack.
    DeliverUp(Packet),
    /// Run broadcast delivery for this transmission across all other nodes.
    Broadcast(Transmission),
    /// Deliver a carrier-sense verdict to the registering layer.
    Notify {
        registrant: Address,
        outcome:    CarrierSenseOutcome,
    },
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Read-only kernel state a handler needs: the clock and the two medium
/// constants every node shares.
pub struct AirCtx<'a> {
    pub now: SimTime,
    /// Fixed one-way signal latency, seconds.
    pub propagation_delay_secs: f64,
    pub mangling: &'a dyn BitManglingModel,
}

// ── Counters ──────────────────────────────────────────────────────────────────

/// Degradation counters.  Recoverable medium errors never stop the run; they
/// are observable only here and in the logs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AirCounters {
    /// Arrivals refused because the radio was busy, off, or sense-only.
    pub dropped:   u64,
    /// Receptions ruined mid-flight: half-duplex overlap or power-off.
    pub discarded: u64,
    /// Completed receptions the bit-mangling model rejected.
    pub mangled:   u64,
    /// `transmit` calls refused while an outgoing transmission was in flight.
    pub busy_rejections: u64,
}

// ── LegacyWindow ──────────────────────────────────────────────────────────────

/// The open variable window of the legacy carrier-sense protocol.
///
/// `id` ties the window to its `CarrierSenseWindowEnd` envelope; an aborted
/// window's end envelope carries a dead id and lands as a no-op even when
/// the same registrant has opened a fresh window since.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LegacyWindow {
    pub interval:   Interval,
    pub registrant: Address,
    pub id:         u64,
}

// ── AirModule ─────────────────────────────────────────────────────────────────

/// The medium interface of a single node.
pub struct AirModule {
    node:  NodeId,
    state: RadioState,
    /// Sense-only radios detect energy but never open a reception.
    cs_only: bool,

    /// The node's own transmission currently on the air, if any.
    outgoing: Option<Transmission>,
    /// Span of the most recent outgoing transmission.  Outlives `outgoing`
    /// so late `TransmissionEndIncoming`s can still detect the overlap.
    last_outgoing: Option<Interval>,

    /// Receptions currently open, keyed by transmission identity.
    incoming: HashMap<TransmissionId, (Transmission, Reachability)>,
    /// Covering envelope of all arrival intervals seen so far; the legacy
    /// carrier-sense min-free check reads this next to `last_interference`,
    /// since a decodable signal is a carrier too.
    last_incoming: Option<Interval>,

    interference: InterferenceQueue,
    /// Covering envelope of all interference intervals seen so far; the
    /// legacy carrier-sense min-free check reads this.
    last_interference: Option<Interval>,

    /// Legacy protocol: the open variable window, if any.
    pub(crate) cs_window: Option<LegacyWindow>,
    /// Generic protocol registrations awaiting resolution.
    pub(crate) unfinished: Vec<CarrierSenseInformation>,
    pub(crate) next_cs_id: u64,

    next_tx_seq: u32,
    counters: AirCounters,
}

impl AirModule {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            state: RadioState::Listening,
            cs_only: false,
            outgoing: None,
            last_outgoing: None,
            incoming: HashMap::new(),
            last_incoming: None,
            interference: InterferenceQueue::new(),
            last_interference: None,
            cs_window: None,
            unfinished: Vec::new(),
            next_cs_id: 0,
            next_tx_seq: 0,
            counters: AirCounters::default(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn state(&self) -> RadioState {
        self.state
    }

    #[inline]
    pub fn counters(&self) -> AirCounters {
        self.counters
    }

    #[inline]
    pub fn interference_history(&self) -> &InterferenceQueue {
        &self.interference
    }

    #[inline]
    pub fn is_transmitting(&self) -> bool {
        self.outgoing.is_some()
    }

    /// Covering envelope of all interference intervals seen so far.
    pub(crate) fn last_interference_span(&self) -> Option<Interval> {
        self.last_interference
    }

    /// Covering envelope of all arrival intervals seen so far.
    pub(crate) fn last_arrival_span(&self) -> Option<Interval> {
        self.last_incoming
    }

    /// End of the node's own transmission, if one occupies instant `now`.
    pub(crate) fn outgoing_end_if_active(&self, now: SimTime) -> Option<SimTime> {
        self.outgoing
            .as_ref()
            .filter(|tx| tx.interval.contains(now))
            .map(Transmission::end)
    }

    /// Restrict the radio to energy detection: carrier sensing keeps
    /// working but arrivals are dropped instead of received.
    pub fn set_carrier_sense_only(&mut self, on: bool) {
        self.cs_only = on;
    }

    /// Power the radio down.  Open receptions stay registered and are
    /// discarded when their end event fires.
    pub fn power_off(&mut self) {
        self.state = RadioState::Off;
    }

    pub fn power_on(&mut self) {
        if self.state == RadioState::Off {
            self.state = RadioState::Listening;
        }
    }

    // ── Event dispatch ────────────────────────────────────────────────────

    /// Deliver one envelope's event.  Arms are ordered by dispatch
    /// precedence; keep new ones in the same order as the enum.
    pub fn handle(&mut self, ctx: &AirCtx<'_>, event: Event) -> AirResult<Vec<AirAction>> {
        let mut actions = Vec::new();
        match event {
            Event::TransmissionReached { transmission, arrival } => {
                actions.push(AirAction::Schedule {
                    delay: ctx.propagation_delay_secs,
                    event: Event::TransmissionBeginIncoming { transmission, arrival },
                });
            }
            Event::TransmissionBeginIncoming { transmission, arrival } => {
                self.begin_incoming(ctx, transmission, arrival, &mut actions);
            }
            Event::TransmissionEndIncoming(id) => {
                self.end_incoming(ctx, id, &mut actions);
            }
            Event::TransmissionEndOutgoing => {
                self.end_outgoing(&mut actions);
            }
            Event::Interference(interference) => {
                self.interference_arrived(interference, &mut actions);
            }
            Event::PerformCarrierSense { registrant, min_free_secs, var_free_secs } => {
                self.legacy_check(ctx, registrant, min_free_secs, var_free_secs, &mut actions);
            }
            Event::CarrierSenseWindowEnd { window_id } => {
                self.legacy_window_end(window_id, &mut actions);
            }
            Event::CarrierSenseRegistration(info) => {
                self.register(ctx, info, &mut actions);
            }
            Event::CarrierSenseDurationEnd { cs_id } => {
                self.duration_end(cs_id, &mut actions);
            }
            Event::CarrierSenseFreeCheck { cs_id } => {
                self.free_check(ctx, cs_id, &mut actions)?;
            }
            other => {
                return Err(AirError::UnexpectedEvent {
                    node: self.node,
                    kind: other.kind_name(),
                });
            }
        }
        Ok(actions)
    }

    // ── Sending ───────────────────────────────────────────────────────────

    /// Put `packet` on the air.
    ///
    /// Fails (and counts the rejection) if an outgoing transmission is
    /// already in flight; the existing transmission is untouched.  On
    /// success the radio goes `Sending`, every pending carrier sense that
    /// cannot coexist with our own signal is resolved, and the kernel is
    /// asked to broadcast and to schedule `TransmissionEndOutgoing`.
    pub fn transmit(
        &mut self,
        now:        SimTime,
        mut packet: Packet,
        signal_dbm: f64,
        expected:   Vec<NodeId>,
    ) -> (bool, Vec<AirAction>) {
        if self.outgoing.is_some() {
            self.counters.busy_rejections += 1;
            debug!("node {}: transmit refused, already sending", self.node);
            return (false, Vec::new());
        }

        let mut actions = Vec::new();
        self.state = RadioState::Sending;
        packet.create_receiver_record(expected);

        let tx = Transmission::new(self.next_transmission_id(), self.node, signal_dbm, now, packet);
        debug!("node {}: transmitting {} for {}", self.node, tx.id, tx.interval);

        self.resolve_senses_on_transmit(&mut actions);

        let duration = tx.interval.duration;
        self.last_outgoing = Some(tx.interval);
        actions.push(AirAction::Broadcast(tx.receiver_copy_at(tx.interval.start)));
        actions.push(AirAction::Schedule {
            delay: duration,
            event: Event::TransmissionEndOutgoing,
        });
        self.outgoing = Some(tx);
        (true, actions)
    }

    /// Node index in the high half, per-node counter in the low half, so
    /// ids are unique across the whole run without central coordination.
    fn next_transmission_id(&mut self) -> TransmissionId {
        let id = TransmissionId(((self.node.0 as u64) << 32) | self.next_tx_seq as u64);
        self.next_tx_seq += 1;
        id
    }

    // ── Reception ─────────────────────────────────────────────────────────

    fn begin_incoming(
        &mut self,
        ctx:          &AirCtx<'_>,
        transmission: Transmission,
        arrival:      Reachability,
        actions:      &mut Vec<AirAction>,
    ) {
        if !self.state.can_receive() || self.cs_only {
            self.counters.dropped += 1;
            let expected_here = transmission
                .packet
                .receivers()
                .is_some_and(|r| r.borrow().expects(self.node));
            if expected_here {
                warn!(
                    "node {}: dropped expected packet from {} (radio {})",
                    self.node, transmission.sender, self.state
                );
            } else {
                debug!(
                    "node {}: dropped arrival from {} (radio {})",
                    self.node, transmission.sender, self.state
                );
            }
            return;
        }

        self.state = RadioState::Receiving;
        let interval = transmission.interval;
        self.last_incoming = Some(match self.last_incoming {
            Some(prev) => prev.merge(&interval),
            None       => interval,
        });
        actions.push(AirAction::Schedule {
            delay: interval.end().since(ctx.now).max(0.0),
            event: Event::TransmissionEndIncoming(transmission.id),
        });
        self.incoming.insert(transmission.id, (transmission, arrival));
    }

    fn end_incoming(&mut self, ctx: &AirCtx<'_>, id: TransmissionId, actions: &mut Vec<AirAction>) {
        let Some((transmission, arrival)) = self.incoming.remove(&id) else {
            return; // reception was never opened; stale envelope
        };
        let others_open = !self.incoming.is_empty();
        let record = transmission.packet.receivers().cloned();
        let sender = transmission.sender;

        // Half-duplex: our own signal during the reception ruins it, even if
        // the outgoing transmission has already ended by now.
        let collided = self
            .last_outgoing
            .is_some_and(|own| own.intersects(&transmission.interval));
        if collided || self.state == RadioState::Off {
            self.counters.discarded += 1;
            if let Some(handle) = &record {
                handle.borrow_mut().invalid.push(self.node);
            }
            debug!(
                "node {}: discarded reception {id} from {sender} ({})",
                self.node,
                if collided { "half-duplex collision" } else { "radio off" },
            );
            return;
        }

        match ctx.mangling.apply(transmission, &arrival, &self.interference) {
            Some(mut packet) if packet.chain_valid() => {
                if let Some(handle) = &record {
                    handle.borrow_mut().valid.push(self.node);
                }
                packet.flip_direction();
                let immediate = packet.immediate_reply();
                actions.push(AirAction::DeliverUp(packet));
                // A valid reception proves no undetected interference
                // occurred, so everything that ended by now is dead weight.
                self.interference.garbage_collect(ctx.now);
                self.settle_after_reception(others_open, immediate);
            }
            Some(_) => {
                self.counters.mangled += 1;
                if let Some(handle) = &record {
                    handle.borrow_mut().invalid.push(self.node);
                }
                debug!("node {}: reception {id} from {sender} garbled, dropping", self.node);
                self.settle_after_reception(others_open, false);
            }
            None => {
                self.counters.mangled += 1;
                if let Some(handle) = &record {
                    handle.borrow_mut().invalid.push(self.node);
                }
                debug!("node {}: reception {id} from {sender} irrecoverable", self.node);
                self.settle_after_reception(others_open, false);
            }
        }
    }

    fn settle_after_reception(&mut self, others_open: bool, immediate: bool) {
        if self.state != RadioState::Receiving {
            return;
        }
        if immediate {
            self.state = RadioState::WillSend;
        } else if !others_open {
            self.state = RadioState::Listening;
        }
    }

    fn end_outgoing(&mut self, actions: &mut Vec<AirAction>) {
        self.outgoing = None;
        if self.state == RadioState::Sending {
            self.state = RadioState::Listening;
        }
        // Virtual negative senses counted our own signal as busy; re-check
        // now that it is gone.
        for info in &self.unfinished {
            if info.negative && info.virtual_sense {
                actions.push(AirAction::Schedule {
                    delay: 0.0,
                    event: Event::CarrierSenseFreeCheck { cs_id: info.id },
                });
            }
        }
    }

    // ── Interference ──────────────────────────────────────────────────────

    fn interference_arrived(&mut self, interference: Interference, actions: &mut Vec<AirAction>) {
        let interval = *interference.interval();
        self.last_interference = Some(match self.last_interference {
            Some(prev) => prev.merge(&interval),
            None       => interval,
        });

        // Legacy rollover: an open variable window dies on contact.
        if let Some(window) = self.cs_window
            && interval.intersects(&window.interval)
        {
            self.cs_window = None;
            actions.push(AirAction::Notify {
                registrant: window.registrant,
                outcome:    CarrierSenseOutcome::CarrierDetected,
            });
        }

        // Generic regular (busy-detect) senses resolve immediately.
        let mut i = 0;
        while i < self.unfinished.len() {
            if self.unfinished[i].negative {
                i += 1;
            } else {
                let info = self.unfinished.remove(i);
                actions.push(AirAction::Notify {
                    registrant: info.registrant,
                    outcome:    CarrierSenseOutcome::CarrierDetected,
                });
            }
        }

        self.interference.add(interference);
    }
}
