//! The event envelope: one event plus its delivery coordinates.

use thiserror::Error;
use wsim_core::SimTime;

use crate::{Event, Recipient};

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Every code path that creates an envelope from within a delivery must
    /// compute a delay ≥ 0 relative to the current clock; a negative delay
    /// indicates a broken delay computation upstream.
    #[error("negative delay {delay} for {kind} envelope")]
    NegativeDelay { delay: f64, kind: &'static str },
}

/// One [`Event`] wrapped with its absolute delivery time and, once enqueued,
/// the sequence number the queue assigned it.
///
/// Immutable after enqueue except for the sequence field, which is written
/// exactly once by [`EnvelopeQueue::add`][crate::EnvelopeQueue::add].
/// Envelopes are destroyed after delivery; the queue has no cancellation
/// primitive — protocol-level cancellation works by removing auxiliary state
/// so a stale envelope's delivery becomes a no-op.
#[derive(Debug)]
pub struct EventEnvelope {
    time:          SimTime,
    pub(crate) seq: u64,
    pub recipient: Recipient,
    pub event:     Event,
}

impl EventEnvelope {
    /// Wrap `event` for delivery `delay` seconds after `now`.
    ///
    /// Rejects negative or non-finite delays — the hard scheduling invariant.
    pub fn new(
        now:       SimTime,
        delay:     f64,
        recipient: Recipient,
        event:     Event,
    ) -> Result<Self, EnvelopeError> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(EnvelopeError::NegativeDelay { delay, kind: event.kind_name() });
        }
        Ok(Self {
            time: now.after(delay),
            seq: 0,
            recipient,
            event,
        })
    }

    /// Absolute delivery time.
    #[inline]
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Enqueue sequence number.  Meaningful only after the envelope has been
    /// added to a queue.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}
