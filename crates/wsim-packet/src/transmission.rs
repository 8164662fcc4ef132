//! One in-flight packet broadcast and the per-receiver propagation verdict.

use wsim_core::{Interval, NodeId, SimTime, TransmissionId};

use crate::Packet;

// ── Transmission ──────────────────────────────────────────────────────────────

/// One broadcast of an outermost packet, carrying the signal strength used to
/// send it.
///
/// The sender's air module keeps one instance for the duration of the
/// transmission; every receiver works on an independent copy whose interval
/// has been shifted by the propagation delay (so its `start` is when the
/// signal begins reaching that receiver).
#[derive(Debug)]
pub struct Transmission {
    pub id:         TransmissionId,
    pub sender:     NodeId,
    /// Transmit power at the antenna, dBm.
    pub signal_dbm: f64,
    /// The span this transmission occupies on the air.
    pub interval:   Interval,
    pub packet:     Packet,
}

impl Transmission {
    /// Create a transmission starting at `start`; the duration comes from the
    /// outermost packet's airtime.
    pub fn new(
        id:         TransmissionId,
        sender:     NodeId,
        signal_dbm: f64,
        start:      SimTime,
        packet:     Packet,
    ) -> Self {
        let interval = Interval::new(start, packet.duration_secs());
        Self { id, sender, signal_dbm, interval, packet }
    }

    #[inline]
    pub fn end(&self) -> SimTime {
        self.interval.end()
    }

    /// The independent receiver-side copy with its interval re-anchored at
    /// `start` (the instant the signal begins reaching the receiver).
    ///
    /// The packet chain is deep-copied (see [`Packet::receiver_copy`] for the
    /// field-by-field sharing contract); id, sender, and signal strength are
    /// plain scalars.
    pub fn receiver_copy_at(&self, start: SimTime) -> Transmission {
        Transmission {
            id:         self.id,
            sender:     self.sender,
            signal_dbm: self.signal_dbm,
            interval:   Interval::new(start, self.interval.duration),
            packet:     self.packet.receiver_copy(),
        }
    }
}

// ── Reachability ──────────────────────────────────────────────────────────────

/// Per-receiver verdict from the propagation model for one
/// (sender, other-node) pair.
///
/// The two flags are independent: a model may legitimately report a signal
/// as both decodable and interference-relevant.  The broadcast loop branches
/// on each flag separately; stock models keep them mutually exclusive by
/// construction, but implementors of custom models must not rely on that.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Reachability {
    /// The signal is strong enough to be decoded.
    pub reachable:   bool,
    /// The signal is detectable and must enter bit-error computation, even
    /// if it cannot be decoded.
    pub interfering: bool,
    /// Received signal strength at the receiver, dBm.
    pub signal_dbm:  f64,
    /// Sender-receiver distance, metres.
    pub distance_m:  f64,
}

impl Reachability {
    /// A signal too weak to matter at all.
    pub fn negligible(signal_dbm: f64, distance_m: f64) -> Self {
        Self { reachable: false, interfering: false, signal_dbm, distance_m }
    }
}
