//! Unit tests for wsim-core primitives.

#[cfg(test)]
mod ids {
    use crate::{NodeId, TransmissionId};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(NodeId(0) < NodeId(1));
        assert!(TransmissionId(100) > TransmissionId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(TransmissionId::INVALID.0, u64::MAX);
    }

    #[test]
    fn display() {
        assert_eq!(NodeId(7).to_string(), "NodeId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::{Interval, SimTime};

    #[test]
    fn sim_time_ordering() {
        assert!(SimTime(1.0) < SimTime(2.0));
        assert!(SimTime(5.0) == SimTime(5.0));
        assert_eq!(SimTime(3.0).after(2.0), SimTime(5.0));
        assert_eq!(SimTime(5.0).since(SimTime(3.0)), 2.0);
    }

    #[test]
    fn interval_end_and_contains() {
        let iv = Interval::new(SimTime(1.0), 2.0);
        assert_eq!(iv.end(), SimTime(3.0));
        assert!(iv.contains(SimTime(1.0)));
        assert!(iv.contains(SimTime(2.999)));
        // Half-open: the end instant is excluded.
        assert!(!iv.contains(SimTime(3.0)));
        assert!(!iv.contains(SimTime(0.999)));
    }

    #[test]
    fn interval_intersection() {
        let a = Interval::new(SimTime(0.0), 2.0);
        let b = Interval::new(SimTime(1.0), 2.0);
        let c = Interval::new(SimTime(2.0), 1.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        // Touching at the boundary does not count (half-open).
        assert!(!a.intersects(&c));
        assert!(!c.intersects(&a));
    }

    #[test]
    fn empty_interval_intersects_nothing() {
        let empty = Interval::new(SimTime(1.0), 0.0);
        let covering = Interval::new(SimTime(0.0), 5.0);
        assert!(empty.is_empty());
        assert!(!empty.intersects(&covering));
        assert!(!covering.intersects(&empty));
    }

    #[test]
    fn merge_covers_both_spans() {
        let a = Interval::new(SimTime(0.0), 1.0);
        let b = Interval::new(SimTime(3.0), 2.0);
        let m = a.merge(&b);
        assert_eq!(m.start, SimTime(0.0));
        assert_eq!(m.end(), SimTime(5.0));
        // Merge is symmetric.
        assert_eq!(b.merge(&a), m);
    }
}

#[cfg(test)]
mod position {
    use crate::Position;

    #[test]
    fn zero_distance() {
        let p = Position::new(10.0, -3.0);
        assert!(p.distance_m(p) < 1e-12);
    }

    #[test]
    fn pythagorean_triple() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance_m(b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn box_check() {
        let center = Position::new(0.0, 0.0);
        assert!(Position::new(5.0, -5.0).within_box(center, 5.0));
        assert!(!Position::new(5.1, 0.0).within_box(center, 5.0));
    }
}

#[cfg(test)]
mod radio {
    use crate::RadioState;

    #[test]
    fn receive_capability() {
        assert!(RadioState::Listening.can_receive());
        assert!(RadioState::Receiving.can_receive());
        assert!(!RadioState::Off.can_receive());
        assert!(!RadioState::Sending.can_receive());
        assert!(!RadioState::WillSend.can_receive());
    }

    #[test]
    fn display() {
        assert_eq!(RadioState::WillSend.to_string(), "will-send");
        assert_eq!(RadioState::Listening.to_string(), "listening");
    }
}

#[cfg(test)]
mod config {
    use crate::SimConfig;

    #[test]
    fn default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_negative_propagation_delay() {
        let cfg = SimConfig { propagation_delay_secs: -1.0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_horizon() {
        let cfg = SimConfig { horizon_secs: 0.0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_steps_per_second() {
        let cfg = SimConfig { steps_per_second: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn step_conversion() {
        let cfg = SimConfig { steps_per_second: 1_000, ..Default::default() };
        assert_eq!(cfg.secs_for_steps(500), 0.5);
    }
}

#[cfg(test)]
mod rng {
    use crate::{NodeId, NodeRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = NodeRng::new(12345, NodeId(0));
        let mut r2 = NodeRng::new(12345, NodeId(0));
        for _ in 0..100 {
            let a: f64 = r1.random();
            let b: f64 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_nodes_differ() {
        let mut r0 = NodeRng::new(1, NodeId(0));
        let mut r1 = NodeRng::new(1, NodeId(1));
        let a: u64 = r0.random();
        let b: u64 = r1.random();
        assert_ne!(a, b, "seeds for adjacent nodes should diverge");
    }

    #[test]
    fn gen_range_in_bounds() {
        let mut rng = NodeRng::new(0, NodeId(0));
        for _ in 0..1000 {
            let v = rng.gen_range(0.0f64..1.0);
            assert!((0.0..1.0).contains(&v));
        }
    }
}
