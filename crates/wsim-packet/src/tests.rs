//! Unit tests for the packet data model.

use wsim_core::{Interval, NodeId, SimTime, TransmissionId};

use crate::{
    Direction, Interference, InterferenceQueue, LayerKind, Packet, PacketDestination,
    Reachability, Transmission,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn app_over_mac(sender: NodeId) -> Packet {
    let inner = Packet::new(LayerKind::Application, sender, PacketDestination::Broadcast, 256);
    let mut outer = Packet::new(LayerKind::Mac, sender, PacketDestination::Broadcast, 64);
    outer.enclose(inner).unwrap();
    outer
}

fn transmission_at(id: u64, start: f64, duration: f64) -> Transmission {
    let mut packet = app_over_mac(NodeId(0));
    packet.set_duration_secs(duration).unwrap();
    Transmission::new(TransmissionId(id), NodeId(0), 14.0, SimTime(start), packet)
}

fn interference_at(id: u64, start: f64, duration: f64) -> Interference {
    let tx = transmission_at(id, start, duration);
    let reach = Reachability {
        reachable:   false,
        interfering: true,
        signal_dbm:  -95.0,
        distance_m:  400.0,
    };
    Interference::new(NodeId(1), tx, reach)
}

// ── Packet chain ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod packet_tests {
    use super::*;

    #[test]
    fn enclose_seals_inner() {
        let packet = app_over_mac(NodeId(3));
        assert!(!packet.is_sealed());
        assert!(packet.enclosed().unwrap().is_sealed());
    }

    #[test]
    fn sealed_packet_rejects_structural_mutation() {
        let mut outer = app_over_mac(NodeId(0));

        // The outer link is still writable.
        assert!(outer.set_header_bits(16).is_ok());

        // The enclosed link is sealed: header, payload, airtime are frozen.
        let inner = outer.enclosed_mut().unwrap();
        assert!(inner.set_header_bits(8).is_err());
        assert!(inner.set_duration_secs(1.0).is_err());
        let extra = Packet::new(LayerKind::Transport, NodeId(0), PacketDestination::Broadcast, 8);
        assert!(inner.enclose(extra).is_err());

        // Receiver-side validity stays settable on a sealed link.
        inner.set_valid(false);
        assert!(!outer.chain_valid());
    }

    #[test]
    fn total_bits_sums_chain() {
        let packet = app_over_mac(NodeId(0));
        assert_eq!(packet.total_bits(), 256 + 64);
    }

    #[test]
    fn flip_direction_recurses() {
        let mut packet = app_over_mac(NodeId(0));
        assert_eq!(packet.direction(), Direction::Downward);
        packet.flip_direction();
        assert_eq!(packet.direction(), Direction::Upward);
        assert_eq!(packet.enclosed().unwrap().direction(), Direction::Upward);
    }

    #[test]
    fn chain_valid_reflects_inner_links() {
        let mut packet = app_over_mac(NodeId(0));
        assert!(packet.chain_valid());
        packet.set_valid(false);
        assert!(!packet.chain_valid());
    }

    #[test]
    fn destination_includes() {
        assert!(PacketDestination::Broadcast.includes(NodeId(9)));
        assert!(PacketDestination::Node(NodeId(4)).includes(NodeId(4)));
        assert!(!PacketDestination::Node(NodeId(4)).includes(NodeId(5)));
    }
}

// ── Receiver record sharing ───────────────────────────────────────────────────

#[cfg(test)]
mod receiver_record_tests {
    use super::*;

    #[test]
    fn record_shared_across_chain() {
        let mut packet = app_over_mac(NodeId(0));
        let handle = packet.create_receiver_record(vec![NodeId(7)]);

        handle.borrow_mut().valid.push(NodeId(2));

        // The inner link sees the same record through its own handle.
        let inner_handle = packet.enclosed().unwrap().receivers().unwrap();
        assert_eq!(inner_handle.borrow().valid, vec![NodeId(2)]);
        assert!(inner_handle.borrow().expects(NodeId(7)));
    }

    #[test]
    fn receiver_copy_shares_record_but_not_validity() {
        let mut original = app_over_mac(NodeId(0));
        original.create_receiver_record(vec![]);

        let mut copy = original.receiver_copy();
        copy.set_valid(false);
        copy.flip_direction();

        // Validity and direction are receiver-private.
        assert!(original.chain_valid());
        assert_eq!(original.direction(), Direction::Downward);

        // The delivery record is the same object on both sides.
        copy.receivers().unwrap().borrow_mut().invalid.push(NodeId(5));
        assert_eq!(original.receivers().unwrap().borrow().invalid, vec![NodeId(5)]);
    }

    #[test]
    fn receiver_copy_duplicates_chain() {
        let original = app_over_mac(NodeId(0));
        let mut copy = original.receiver_copy();
        copy.flip_direction();
        // The original's inner link is untouched by the copy's mutation.
        assert_eq!(original.enclosed().unwrap().direction(), Direction::Downward);
        assert_eq!(copy.enclosed().unwrap().direction(), Direction::Upward);
    }
}

// ── Transmission ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod transmission_tests {
    use super::*;

    #[test]
    fn interval_from_packet_duration() {
        let tx = transmission_at(1, 2.0, 0.5);
        assert_eq!(tx.interval.start, SimTime(2.0));
        assert_eq!(tx.end(), SimTime(2.5));
    }

    #[test]
    fn receiver_copy_reanchors_interval() {
        let tx = transmission_at(1, 2.0, 0.5);
        let copy = tx.receiver_copy_at(SimTime(2.001));
        assert_eq!(copy.interval.start, SimTime(2.001));
        assert_eq!(copy.interval.duration, 0.5);
        assert_eq!(copy.id, tx.id);
        // Sender-side interval is untouched.
        assert_eq!(tx.interval.start, SimTime(2.0));
    }
}

// ── Interference ordering and queue ───────────────────────────────────────────

#[cfg(test)]
mod interference_tests {
    use super::*;

    #[test]
    fn ordered_by_start_then_duration_then_id() {
        let early = interference_at(5, 1.0, 1.0);
        let late = interference_at(1, 2.0, 1.0);
        let short = interference_at(9, 1.0, 0.5);
        assert!(early < late);
        assert!(short < early, "shorter duration sorts first at equal start");

        let a = interference_at(1, 1.0, 1.0);
        let b = interference_at(2, 1.0, 1.0);
        assert!(a < b, "id breaks full ties");
    }

    #[test]
    fn queue_keeps_sorted_order() {
        let mut q = InterferenceQueue::new();
        q.add(interference_at(1, 3.0, 1.0));
        q.add(interference_at(2, 1.0, 1.0));
        q.add(interference_at(3, 2.0, 1.0));
        let starts: Vec<f64> = q.iter().map(|i| i.interval().start.secs()).collect();
        assert_eq!(starts, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn overlap_queries() {
        let mut q = InterferenceQueue::new();
        q.add(interference_at(1, 1.0, 2.0)); // [1, 3)
        q.add(interference_at(2, 2.0, 3.0)); // [2, 5)

        assert!(q.any_overlapping(SimTime(2.5)));
        assert!(!q.any_overlapping(SimTime(5.0)));
        assert_eq!(q.busy_until(SimTime(2.5)), Some(SimTime(5.0)));
        assert_eq!(q.busy_until(SimTime(6.0)), None);

        let window = Interval::new(SimTime(4.0), 2.0);
        assert!(q.any_intersecting(&window));
        let clear = Interval::new(SimTime(5.0), 2.0);
        assert!(!q.any_intersecting(&clear));
    }

    #[test]
    fn gc_removes_only_ended_records() {
        let mut q = InterferenceQueue::new();
        q.add(interference_at(1, 0.0, 1.0)); // ends 1.0
        q.add(interference_at(2, 0.5, 1.0)); // ends 1.5
        q.add(interference_at(3, 1.0, 5.0)); // ends 6.0

        let removed = q.garbage_collect(SimTime(1.5));
        assert_eq!(removed, 2);
        assert_eq!(q.len(), 1);
        // The surviving record still covers its span.
        assert!(q.any_overlapping(SimTime(3.0)));
    }

    #[test]
    fn gc_retains_record_still_running_at_cutoff() {
        let mut q = InterferenceQueue::new();
        q.add(interference_at(1, 0.0, 2.0)); // ends 2.0
        assert_eq!(q.garbage_collect(SimTime(1.999)), 0);
        assert_eq!(q.garbage_collect(SimTime(2.0)), 1);
    }
}
