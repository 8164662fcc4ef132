//! The layered packet chain and its shared delivery record.
//!
//! # Why the receiver record is a shared handle
//!
//! Any layer of a multi-layer packet may want to know who actually received
//! the broadcast (MAC for retransmission, routing for neighbour discovery).
//! Rather than aliasing one list across the chain implicitly, the outermost
//! transmission creates exactly one [`ReceiverRecord`] and every link holds a
//! clone of the same `Rc<RefCell<…>>` handle.  The sharing is explicit and
//! lifetime-bound to the transmission: drop the packets and the record goes
//! with them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use wsim_core::NodeId;

// ── Basic enums ───────────────────────────────────────────────────────────────

/// Which way a packet is travelling through a node's layer stack.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Direction {
    /// From the medium towards the application.
    Upward,
    /// From the application towards the medium.
    Downward,
}

impl Direction {
    #[inline]
    pub fn flipped(self) -> Direction {
        match self {
            Direction::Upward   => Direction::Downward,
            Direction::Downward => Direction::Upward,
        }
    }
}

/// The protocol layer that created a packet link.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum LayerKind {
    Physical,
    Mac,
    Network,
    Transport,
    Application,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LayerKind::Physical    => "physical",
            LayerKind::Mac         => "mac",
            LayerKind::Network     => "network",
            LayerKind::Transport   => "transport",
            LayerKind::Application => "application",
        };
        f.write_str(s)
    }
}

/// A (node, layer) pair — where a packet link came from or where a
/// carrier-sense result must be delivered.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Address {
    pub node:  NodeId,
    pub layer: LayerKind,
}

impl Address {
    #[inline]
    pub fn new(node: NodeId, layer: LayerKind) -> Self {
        Self { node, layer }
    }
}

/// Where a packet is addressed on the medium.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PacketDestination {
    Node(NodeId),
    Broadcast,
}

impl PacketDestination {
    /// `true` if `node` is an intended recipient.
    #[inline]
    pub fn includes(self, node: NodeId) -> bool {
        match self {
            PacketDestination::Node(n)   => n == node,
            PacketDestination::Broadcast => true,
        }
    }
}

// ── Receiver record ───────────────────────────────────────────────────────────

/// The per-broadcast delivery record shared across one packet chain.
#[derive(Debug, Default)]
pub struct ReceiverRecord {
    /// Nodes that decoded the packet successfully.
    pub valid:    Vec<NodeId>,
    /// Nodes where the packet arrived but was mangled beyond recovery.
    pub invalid:  Vec<NodeId>,
    /// Nodes the sender considers important recipients; a drop at one of
    /// these is worth a warning.
    pub expected: Vec<NodeId>,
}

impl ReceiverRecord {
    /// `true` if `node` is on the expected-receivers list.
    pub fn expects(&self, node: NodeId) -> bool {
        self.expected.contains(&node)
    }
}

/// Shared handle to one [`ReceiverRecord`].  Every link of a packet chain
/// (and every receiver-side copy) holds a clone of the same handle.
pub type ReceiverHandle = Rc<RefCell<ReceiverRecord>>;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PacketError {
    /// The packet was enclosed inside another and is write-protected.
    #[error("packet created by {layer} layer is sealed and cannot be modified")]
    WriteProtected { layer: LayerKind },
}

// ── Packet ────────────────────────────────────────────────────────────────────

/// One link of a layered packet.
///
/// Each link is annotated with the layer that created it, its header size,
/// travel direction, and a validity flag the bit-mangling model may clear.
/// `enclosed` points at the payload handed down by the layer above; once a
/// packet is enclosed it is sealed — header length and payload pointer are
/// write-protected for the rest of its life.
#[derive(Debug)]
pub struct Packet {
    layer:       LayerKind,
    header_bits: u32,
    direction:   Direction,
    valid:       bool,
    sender:      NodeId,
    destination: PacketDestination,
    /// Airtime of the full chain in seconds; meaningful on the outermost link.
    duration_secs: f64,
    /// MAC demands an immediate follow-up transmission after a valid
    /// reception of this packet (`RadioState::WillSend`).
    immediate_reply: bool,
    sealed:      bool,
    enclosed:    Option<Box<Packet>>,
    receivers:   Option<ReceiverHandle>,
}

impl Packet {
    /// Create a fresh, unsealed, downward-travelling packet link.
    pub fn new(
        layer:       LayerKind,
        sender:      NodeId,
        destination: PacketDestination,
        header_bits: u32,
    ) -> Self {
        Self {
            layer,
            header_bits,
            direction: Direction::Downward,
            valid: true,
            sender,
            destination,
            duration_secs: 0.0,
            immediate_reply: false,
            sealed: false,
            enclosed: None,
            receivers: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn layer(&self) -> LayerKind {
        self.layer
    }

    #[inline]
    pub fn header_bits(&self) -> u32 {
        self.header_bits
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// `true` only if this link and every enclosed link are valid.
    pub fn chain_valid(&self) -> bool {
        self.valid && self.enclosed.as_deref().is_none_or(Packet::chain_valid)
    }

    #[inline]
    pub fn sender(&self) -> NodeId {
        self.sender
    }

    #[inline]
    pub fn destination(&self) -> PacketDestination {
        self.destination
    }

    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    #[inline]
    pub fn immediate_reply(&self) -> bool {
        self.immediate_reply
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    #[inline]
    pub fn enclosed(&self) -> Option<&Packet> {
        self.enclosed.as_deref()
    }

    /// Mutable access to the payload link.  Sealing still applies: the inner
    /// packet's structural mutators keep failing, but receiver-side state
    /// (validity) stays settable, which is what bit-mangling models need.
    #[inline]
    pub fn enclosed_mut(&mut self) -> Option<&mut Packet> {
        self.enclosed.as_deref_mut()
    }

    #[inline]
    pub fn receivers(&self) -> Option<&ReceiverHandle> {
        self.receivers.as_ref()
    }

    /// Total size of the chain: this header plus all enclosed links.
    pub fn total_bits(&self) -> u64 {
        self.header_bits as u64
            + self.enclosed.as_deref().map_or(0, Packet::total_bits)
    }

    // ── Mutators ──────────────────────────────────────────────────────────

    /// Wrap `inner` as this link's payload, sealing it.
    ///
    /// Fails if `self` is itself sealed (it was already enclosed elsewhere).
    pub fn enclose(&mut self, mut inner: Packet) -> Result<(), PacketError> {
        if self.sealed {
            return Err(PacketError::WriteProtected { layer: self.layer });
        }
        inner.sealed = true;
        self.enclosed = Some(Box::new(inner));
        Ok(())
    }

    /// Adjust the header length.  Fails on a sealed packet.
    pub fn set_header_bits(&mut self, bits: u32) -> Result<(), PacketError> {
        if self.sealed {
            return Err(PacketError::WriteProtected { layer: self.layer });
        }
        self.header_bits = bits;
        Ok(())
    }

    /// Set the airtime of the outermost link.  Fails on a sealed packet.
    pub fn set_duration_secs(&mut self, secs: f64) -> Result<(), PacketError> {
        if self.sealed {
            return Err(PacketError::WriteProtected { layer: self.layer });
        }
        self.duration_secs = secs;
        Ok(())
    }

    /// Mark the packet as demanding an immediate reply transmission.
    pub fn set_immediate_reply(&mut self, flag: bool) -> Result<(), PacketError> {
        if self.sealed {
            return Err(PacketError::WriteProtected { layer: self.layer });
        }
        self.immediate_reply = flag;
        Ok(())
    }

    /// Clear the validity flag on this link.  Always permitted: validity is
    /// receiver-side state, set by the bit-mangling model on the receiver's
    /// private copy.
    #[inline]
    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    /// Flip the travel direction of every link in the chain.  Done once by
    /// the air module when a decoded packet is handed upward.
    pub fn flip_direction(&mut self) {
        self.direction = self.direction.flipped();
        if let Some(inner) = self.enclosed.as_deref_mut() {
            inner.flip_direction();
        }
    }

    // ── Receiver record ───────────────────────────────────────────────────

    /// Create the per-broadcast delivery record and install the same handle
    /// on every link of the chain.  Called once by the air module when the
    /// outermost packet goes on the air.
    pub fn create_receiver_record(&mut self, expected: Vec<NodeId>) -> ReceiverHandle {
        let handle: ReceiverHandle = Rc::new(RefCell::new(ReceiverRecord {
            valid: Vec::new(),
            invalid: Vec::new(),
            expected,
        }));
        self.install_receivers(&handle);
        handle
    }

    fn install_receivers(&mut self, handle: &ReceiverHandle) {
        self.receivers = Some(Rc::clone(handle));
        if let Some(inner) = self.enclosed.as_deref_mut() {
            inner.install_receivers(handle);
        }
    }

    // ── Duplication ───────────────────────────────────────────────────────

    /// Produce the independent receiver-side copy of this packet.
    ///
    /// Field-by-field semantics:
    ///
    /// | Field             | Treatment                                       |
    /// |-------------------|-------------------------------------------------|
    /// | `enclosed` chain  | **duplicated** recursively (receiver-private)   |
    /// | `valid`           | duplicated — each receiver flips its own copy   |
    /// | `direction`       | duplicated — flipped on the receiver side only  |
    /// | `receivers`       | **shared** — same `Rc` handle as the sender's   |
    /// | everything else   | `Copy` scalars, duplicated by value             |
    ///
    /// Per-receiver mutation (validity, direction) therefore cannot leak back
    /// to the sender, while the delivery record stays common to all parties.
    pub fn receiver_copy(&self) -> Packet {
        Packet {
            layer:           self.layer,
            header_bits:     self.header_bits,
            direction:       self.direction,
            valid:           self.valid,
            sender:          self.sender,
            destination:     self.destination,
            duration_secs:   self.duration_secs,
            immediate_reply: self.immediate_reply,
            sealed:          self.sealed,
            enclosed:        self.enclosed.as_deref().map(|p| Box::new(p.receiver_copy())),
            receivers:       self.receivers.as_ref().map(Rc::clone),
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} packet from {} ({} bits{})",
            self.layer,
            self.sender,
            self.total_bits(),
            if self.chain_valid() { "" } else { ", invalid" },
        )
    }
}
