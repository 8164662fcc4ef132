//! The closed set of schedulable events.
//!
//! Events form a single tagged enum rather than an open trait hierarchy so
//! that every consumer dispatches with an exhaustive `match`.  The variant
//! order below mirrors the air module's dispatch precedence — more specific
//! transmission events before the generic ones — and handlers are expected
//! to keep their match arms in the same order, since that precedence is
//! semantically load-bearing.

use wsim_core::{NodeId, TransmissionId};
use wsim_packet::{Address, Interference, Packet, Reachability, Transmission};

use crate::{CarrierSenseInformation, CarrierSenseOutcome};

// ── GeneratorKind ─────────────────────────────────────────────────────────────

/// The three self-rescheduling kernel generators.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum GeneratorKind {
    /// Moves nodes across the deployment area.
    Movement,
    /// Injects application traffic.
    Traffic,
    /// Staggers node power-on at simulation start.
    NodeStartup,
}

impl std::fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GeneratorKind::Movement    => "movement",
            GeneratorKind::Traffic     => "traffic",
            GeneratorKind::NodeStartup => "node-startup",
        };
        f.write_str(s)
    }
}

// ── Event ─────────────────────────────────────────────────────────────────────

/// One schedulable unit of work.
#[derive(Debug)]
pub enum Event {
    // ── Medium events (air module), most specific first ───────────────────
    /// A transmission's signal has reached this node's vicinity; the air
    /// module schedules `TransmissionBeginIncoming` one propagation delay
    /// later.  `arrival` is the propagation verdict for this
    /// (sender, receiver) pair and rides along so the mangling model can
    /// see the received signal strength.
    TransmissionReached {
        transmission: Transmission,
        arrival:      Reachability,
    },
    /// The signal front arrives: reception begins (or is dropped).
    TransmissionBeginIncoming {
        transmission: Transmission,
        arrival:      Reachability,
    },
    /// The signal tail passes; the reception identified by the id completes.
    TransmissionEndIncoming(TransmissionId),
    /// The node's own outgoing transmission leaves the air.
    TransmissionEndOutgoing,
    /// A non-decodable signal touches this node.
    Interference(Interference),

    // ── Legacy two-phase carrier sense ────────────────────────────────────
    /// Start (or re-check) the min-free phase of the legacy protocol.
    PerformCarrierSense {
        registrant:    Address,
        min_free_secs: f64,
        var_free_secs: f64,
    },
    /// The legacy variable window identified by `window_id` elapsed.  The id
    /// lets an aborted window's still-in-flight end envelope land as a no-op
    /// instead of resolving a window opened later.
    CarrierSenseWindowEnd { window_id: u64 },

    // ── Generic carrier-sense protocol ────────────────────────────────────
    CarrierSenseRegistration(CarrierSenseInformation),
    /// The requested sensing duration elapsed for registration `cs_id`.
    CarrierSenseDurationEnd { cs_id: u64 },
    /// Re-check whether the medium has become free for registration `cs_id`.
    CarrierSenseFreeCheck { cs_id: u64 },

    // ── Node / layer events ───────────────────────────────────────────────
    /// Delivered once to every layer of a node shortly after setup.
    Initialize,
    /// A packet travelling through the layer stack; routed by its direction.
    Packet(Packet),
    /// A layer-scheduled timer.  The tag is opaque to the kernel.
    WakeUp { tag: u64 },
    /// Resolution of a carrier-sense request, delivered to the registrant.
    CarrierSenseResult { outcome: CarrierSenseOutcome },

    // ── Kernel generators ─────────────────────────────────────────────────
    GeneratorTick(GeneratorKind),
}

impl Event {
    /// Short human-readable tag for logs and fatal diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::TransmissionReached { .. }       => "transmission-reached",
            Event::TransmissionBeginIncoming { .. } => "transmission-begin-incoming",
            Event::TransmissionEndIncoming(_)   => "transmission-end-incoming",
            Event::TransmissionEndOutgoing      => "transmission-end-outgoing",
            Event::Interference(_)              => "interference",
            Event::PerformCarrierSense { .. }   => "perform-carrier-sense",
            Event::CarrierSenseWindowEnd { .. } => "carrier-sense-window-end",
            Event::CarrierSenseRegistration(_)  => "carrier-sense-registration",
            Event::CarrierSenseDurationEnd { .. } => "carrier-sense-duration-end",
            Event::CarrierSenseFreeCheck { .. } => "carrier-sense-free-check",
            Event::Initialize                   => "initialize",
            Event::Packet(_)                    => "packet",
            Event::WakeUp { .. }                => "wake-up",
            Event::CarrierSenseResult { .. }    => "carrier-sense-result",
            Event::GeneratorTick(_)             => "generator-tick",
        }
    }
}

// ── Recipient ─────────────────────────────────────────────────────────────────

/// Who an envelope is delivered to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Recipient {
    /// The node's air module (medium interface).
    Air(NodeId),
    /// The node's whole layer stack (`Initialize`) or a direction-routed
    /// packet traversal.
    Stack(NodeId),
    /// One specific layer of one node (wake-ups, carrier-sense results).
    Layer(Address),
    /// A kernel generator.
    Generator(GeneratorKind),
}

impl Recipient {
    /// The node this envelope concerns, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Recipient::Air(n) | Recipient::Stack(n) => Some(*n),
            Recipient::Layer(addr)                  => Some(addr.node),
            Recipient::Generator(_)                 => None,
        }
    }
}
