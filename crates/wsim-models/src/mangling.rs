//! Bit-mangling models: does a completed reception decode?

use wsim_packet::{InterferenceQueue, Packet, Reachability, Transmission};

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Resolves a completed reception against the receiver's interference
/// history.
///
/// `transmission` is the receiver-side copy whose interval describes when
/// the signal was present at this node; `arrival` is the propagation verdict
/// computed for this (sender, receiver) pair, carrying the received signal
/// strength.  Returns the resulting packet with its validity flags set, or
/// `None` when the packet is irrecoverable and not worth delivering at all.
pub trait BitManglingModel {
    fn apply(
        &self,
        transmission: Transmission,
        arrival:      &Reachability,
        history:      &InterferenceQueue,
    ) -> Option<Packet>;
}

// ── CollisionFreeMangling ─────────────────────────────────────────────────────

/// Ignores interference entirely: every completed reception decodes.
/// Useful for protocol logic tests where the medium should be perfect.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollisionFreeMangling;

impl BitManglingModel for CollisionFreeMangling {
    fn apply(
        &self,
        transmission: Transmission,
        _arrival:     &Reachability,
        _history:     &InterferenceQueue,
    ) -> Option<Packet> {
        Some(transmission.packet)
    }
}

// ── SirThresholdMangling ──────────────────────────────────────────────────────

/// Capture-ratio test: the reception survives only if its received power
/// exceeds every overlapping interferer's by at least `capture_ratio_db`.
///
/// - No overlapping interference → packet decodes unchanged.
/// - An interferer within the capture ratio but weaker than the signal →
///   the packet arrives but is marked invalid (checksum-failure analog).
/// - An interferer at or above the signal's own power → irrecoverable; the
///   radio never even synchronises, so `None`.
#[derive(Clone, Copy, Debug)]
pub struct SirThresholdMangling {
    pub capture_ratio_db: f64,
}

impl SirThresholdMangling {
    pub fn new(capture_ratio_db: f64) -> Self {
        Self { capture_ratio_db }
    }
}

impl BitManglingModel for SirThresholdMangling {
    fn apply(
        &self,
        transmission: Transmission,
        arrival:      &Reachability,
        history:      &InterferenceQueue,
    ) -> Option<Packet> {
        let window = transmission.interval;
        let mut worst_sir_db = f64::INFINITY;

        for entry in history.iter() {
            if entry.transmission.id == transmission.id {
                continue; // the signal is not its own interferer
            }
            if !entry.interval().intersects(&window) {
                continue;
            }
            let sir = arrival.signal_dbm - entry.reachability.signal_dbm;
            worst_sir_db = worst_sir_db.min(sir);
        }

        if worst_sir_db <= 0.0 {
            return None;
        }

        let mut packet = transmission.packet;
        if worst_sir_db < self.capture_ratio_db {
            packet.set_valid(false);
        }
        Some(packet)
    }
}
