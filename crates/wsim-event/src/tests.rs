//! Unit tests for envelopes and the deterministic queue.

use wsim_core::{NodeId, SimTime};
use wsim_packet::{Address, LayerKind};

use crate::{EnvelopeQueue, Event, EventEnvelope, GeneratorKind, Recipient};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn wake_envelope(now: f64, delay: f64, tag: u64) -> EventEnvelope {
    EventEnvelope::new(
        SimTime(now),
        delay,
        Recipient::Layer(Address::new(NodeId(0), LayerKind::Mac)),
        Event::WakeUp { tag },
    )
    .unwrap()
}

fn wake_tag(envelope: &EventEnvelope) -> u64 {
    match envelope.event {
        Event::WakeUp { tag } => tag,
        ref other => panic!("expected wake-up, got {}", other.kind_name()),
    }
}

// ── Envelope construction ─────────────────────────────────────────────────────

#[cfg(test)]
mod envelope_tests {
    use super::*;

    #[test]
    fn delivery_time_is_now_plus_delay() {
        let e = wake_envelope(2.0, 0.5, 0);
        assert_eq!(e.time(), SimTime(2.5));
    }

    #[test]
    fn zero_delay_allowed() {
        assert!(EventEnvelope::new(
            SimTime(1.0),
            0.0,
            Recipient::Air(NodeId(0)),
            Event::TransmissionEndOutgoing,
        )
        .is_ok());
    }

    #[test]
    fn negative_delay_rejected() {
        let r = EventEnvelope::new(
            SimTime(1.0),
            -0.001,
            Recipient::Air(NodeId(0)),
            Event::TransmissionEndOutgoing,
        );
        assert!(r.is_err());
    }

    #[test]
    fn non_finite_delay_rejected() {
        assert!(EventEnvelope::new(
            SimTime(0.0),
            f64::NAN,
            Recipient::Generator(GeneratorKind::Traffic),
            Event::GeneratorTick(GeneratorKind::Traffic),
        )
        .is_err());
        assert!(EventEnvelope::new(
            SimTime(0.0),
            f64::INFINITY,
            Recipient::Generator(GeneratorKind::Traffic),
            Event::GeneratorTick(GeneratorKind::Traffic),
        )
        .is_err());
    }

    #[test]
    fn recipient_node_lookup() {
        assert_eq!(Recipient::Air(NodeId(3)).node(), Some(NodeId(3)));
        assert_eq!(
            Recipient::Layer(Address::new(NodeId(5), LayerKind::Mac)).node(),
            Some(NodeId(5))
        );
        assert_eq!(Recipient::Generator(GeneratorKind::Movement).node(), None);
    }
}

// ── Queue ordering laws ───────────────────────────────────────────────────────

#[cfg(test)]
mod queue_tests {
    use super::*;

    #[test]
    fn polls_in_time_order() {
        let mut q = EnvelopeQueue::new();
        q.add(wake_envelope(0.0, 3.0, 3));
        q.add(wake_envelope(0.0, 1.0, 1));
        q.add(wake_envelope(0.0, 2.0, 2));

        let order: Vec<u64> = std::iter::from_fn(|| q.poll()).map(|e| wake_tag(&e)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn equal_times_poll_in_fifo_order() {
        // Two envelopes inserted with time=5.0 in order e1, e2 → polling
        // yields e1 then e2.
        let mut q = EnvelopeQueue::new();
        q.add(wake_envelope(5.0, 0.0, 1));
        q.add(wake_envelope(5.0, 0.0, 2));
        assert_eq!(wake_tag(&q.poll().unwrap()), 1);
        assert_eq!(wake_tag(&q.poll().unwrap()), 2);
        assert!(q.poll().is_none());
    }

    #[test]
    fn fifo_holds_for_any_interleaving() {
        // Enqueue batches with interleaved times; equal-time entries must
        // come out in insertion order regardless of the surrounding mix.
        let mut q = EnvelopeQueue::new();
        q.add(wake_envelope(2.0, 0.0, 20));
        q.add(wake_envelope(1.0, 0.0, 10));
        q.add(wake_envelope(2.0, 0.0, 21));
        q.add(wake_envelope(1.0, 0.0, 11));
        q.add(wake_envelope(2.0, 0.0, 22));
        q.add(wake_envelope(1.0, 0.0, 12));

        let order: Vec<u64> = std::iter::from_fn(|| q.poll()).map(|e| wake_tag(&e)).collect();
        assert_eq!(order, vec![10, 11, 12, 20, 21, 22]);
    }

    #[test]
    fn poll_times_never_decrease() {
        let mut q = EnvelopeQueue::new();
        for (now, delay) in [(0.0, 4.0), (0.0, 0.5), (0.0, 2.25), (0.0, 0.5), (0.0, 7.0)] {
            q.add(wake_envelope(now, delay, 0));
        }
        let mut last = SimTime(f64::NEG_INFINITY);
        while let Some(e) = q.poll() {
            assert!(e.time() >= last, "times must be non-decreasing");
            last = e.time();
        }
    }

    #[test]
    fn sequence_numbers_monotone_from_zero() {
        let mut q = EnvelopeQueue::new();
        q.add(wake_envelope(1.0, 0.0, 0));
        q.add(wake_envelope(0.0, 0.0, 0));
        assert_eq!(q.enqueued_total(), 2);

        let first = q.poll().unwrap();
        let second = q.poll().unwrap();
        // Seq reflects insertion order, not poll order.
        assert_eq!(first.seq(), 1);
        assert_eq!(second.seq(), 0);
    }

    #[test]
    fn sequences_not_reused_after_drain() {
        let mut q = EnvelopeQueue::new();
        q.add(wake_envelope(0.0, 0.0, 0));
        q.poll().unwrap();
        q.add(wake_envelope(0.0, 0.0, 0));
        let e = q.poll().unwrap();
        assert_eq!(e.seq(), 1, "sequence numbers continue past drained entries");
    }

    #[test]
    fn next_time_peeks_without_removing() {
        let mut q = EnvelopeQueue::new();
        assert_eq!(q.next_time(), None);
        q.add(wake_envelope(0.0, 1.5, 0));
        assert_eq!(q.next_time(), Some(SimTime(1.5)));
        assert_eq!(q.len(), 1);
    }
}
