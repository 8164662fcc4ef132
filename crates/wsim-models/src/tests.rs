//! Unit tests for the stock propagation and mangling models.

use wsim_core::{NodeId, Position, SimRng, SimTime, TransmissionId};
use wsim_packet::{
    Interference, InterferenceQueue, LayerKind, Packet, PacketDestination, Reachability,
    Transmission,
};

use crate::{
    BitManglingModel, CollisionFreeMangling, LogDistanceModel, PhysicalModel,
    SirThresholdMangling, UnitDiskModel,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn rng() -> SimRng {
    SimRng::new(42)
}

fn transmission(id: u64, sender: u32, start: f64, duration: f64) -> Transmission {
    let mut packet =
        Packet::new(LayerKind::Mac, NodeId(sender), PacketDestination::Broadcast, 128);
    packet.set_duration_secs(duration).unwrap();
    Transmission::new(TransmissionId(id), NodeId(sender), 14.0, SimTime(start), packet)
}

fn arrival(signal_dbm: f64) -> Reachability {
    Reachability { reachable: true, interfering: false, signal_dbm, distance_m: 50.0 }
}

fn interferer(id: u64, start: f64, duration: f64, signal_dbm: f64) -> Interference {
    let tx = transmission(id, 99, start, duration);
    let reach = Reachability {
        reachable:   false,
        interfering: true,
        signal_dbm,
        distance_m:  300.0,
    };
    Interference::new(NodeId(1), tx, reach)
}

// ── UnitDiskModel ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod unit_disk {
    use super::*;

    #[test]
    fn three_zones() {
        let model = UnitDiskModel::new(100.0, 250.0);
        let sender = Position::new(0.0, 0.0);
        let mut rng = rng();

        let near = model.reachability(Position::new(50.0, 0.0), sender, 14.0, &mut rng);
        assert!(near.reachable && !near.interfering);

        let mid = model.reachability(Position::new(200.0, 0.0), sender, 14.0, &mut rng);
        assert!(!mid.reachable && mid.interfering);

        let far = model.reachability(Position::new(300.0, 0.0), sender, 14.0, &mut rng);
        assert!(!far.reachable && !far.interfering);
    }

    #[test]
    fn boundary_is_inclusive() {
        let model = UnitDiskModel::new(100.0, 250.0);
        let sender = Position::new(0.0, 0.0);
        let mut rng = rng();
        let edge = model.reachability(Position::new(100.0, 0.0), sender, 14.0, &mut rng);
        assert!(edge.reachable);
        let rim = model.reachability(Position::new(250.0, 0.0), sender, 14.0, &mut rng);
        assert!(rim.interfering);
    }

    #[test]
    fn interference_radius_clamped_to_reach() {
        let model = UnitDiskModel::new(100.0, 10.0);
        assert_eq!(model.interference_radius_m, 100.0);
    }
}

// ── LogDistanceModel ──────────────────────────────────────────────────────────

#[cfg(test)]
mod log_distance {
    use super::*;

    #[test]
    fn rssi_decreases_with_distance() {
        let model = LogDistanceModel::new();
        let a = model.mean_rssi_dbm(10.0, 14.0);
        let b = model.mean_rssi_dbm(100.0, 14.0);
        let c = model.mean_rssi_dbm(1000.0, 14.0);
        assert!(a > b && b > c);
    }

    #[test]
    fn sub_reference_distance_collapses_to_reference_loss() {
        let model = LogDistanceModel::new();
        assert_eq!(model.mean_rssi_dbm(0.5, 14.0), model.mean_rssi_dbm(0.1, 14.0));
    }

    #[test]
    fn verdict_zones_are_exclusive() {
        let model = LogDistanceModel::new();
        let sender = Position::new(0.0, 0.0);
        let mut rng = rng();
        // Sweep distances; the flags must never both be set.
        for d in [1.0, 10.0, 50.0, 100.0, 500.0, 2_000.0, 20_000.0] {
            let r = model.reachability(Position::new(d, 0.0), sender, 14.0, &mut rng);
            assert!(!(r.reachable && r.interfering), "both flags set at {d} m");
        }
    }

    #[test]
    fn shadowing_is_seed_deterministic() {
        let model = LogDistanceModel { shadowing_sigma_db: 6.0, ..LogDistanceModel::new() };
        let sender = Position::new(0.0, 0.0);
        let receiver = Position::new(300.0, 0.0);

        let mut rng1 = SimRng::new(7);
        let mut rng2 = SimRng::new(7);
        let r1 = model.reachability(receiver, sender, 14.0, &mut rng1);
        let r2 = model.reachability(receiver, sender, 14.0, &mut rng2);
        assert_eq!(r1.signal_dbm, r2.signal_dbm);
    }
}

// ── Mangling models ───────────────────────────────────────────────────────────

#[cfg(test)]
mod mangling {
    use super::*;

    #[test]
    fn collision_free_always_decodes() {
        let mut history = InterferenceQueue::new();
        history.add(interferer(9, 0.0, 10.0, 0.0)); // loud and long
        let result =
            CollisionFreeMangling.apply(transmission(1, 0, 1.0, 0.5), &arrival(-80.0), &history);
        assert!(result.is_some_and(|p| p.chain_valid()));
    }

    #[test]
    fn clean_history_decodes() {
        let model = SirThresholdMangling::new(10.0);
        let history = InterferenceQueue::new();
        let result = model.apply(transmission(1, 0, 1.0, 0.5), &arrival(-80.0), &history);
        assert!(result.is_some_and(|p| p.chain_valid()));
    }

    #[test]
    fn non_overlapping_interference_ignored() {
        let model = SirThresholdMangling::new(10.0);
        let mut history = InterferenceQueue::new();
        history.add(interferer(9, 5.0, 1.0, -10.0)); // after the packet
        let result = model.apply(transmission(1, 0, 1.0, 0.5), &arrival(-80.0), &history);
        assert!(result.is_some_and(|p| p.chain_valid()));
    }

    #[test]
    fn weak_overlap_marks_invalid() {
        let model = SirThresholdMangling::new(10.0);
        let mut history = InterferenceQueue::new();
        // SIR = -80 - (-85) = 5 dB: above 0, below the 10 dB capture ratio.
        history.add(interferer(9, 1.0, 0.5, -85.0));
        let result = model.apply(transmission(1, 0, 1.0, 0.5), &arrival(-80.0), &history);
        let packet = result.expect("packet should arrive, mangled");
        assert!(!packet.chain_valid());
    }

    #[test]
    fn dominant_overlap_is_irrecoverable() {
        let model = SirThresholdMangling::new(10.0);
        let mut history = InterferenceQueue::new();
        history.add(interferer(9, 1.0, 0.5, -75.0)); // louder than the signal
        let result = model.apply(transmission(1, 0, 1.0, 0.5), &arrival(-80.0), &history);
        assert!(result.is_none());
    }

    #[test]
    fn own_transmission_not_its_interferer() {
        let model = SirThresholdMangling::new(10.0);
        let mut history = InterferenceQueue::new();
        // Same transmission id as the reception under test.
        let own = Interference::new(
            NodeId(1),
            transmission(1, 0, 1.0, 0.5),
            Reachability { reachable: false, interfering: true, signal_dbm: 0.0, distance_m: 0.0 },
        );
        history.add(own);
        let result = model.apply(transmission(1, 0, 1.0, 0.5), &arrival(-80.0), &history);
        assert!(result.is_some_and(|p| p.chain_valid()));
    }
}
