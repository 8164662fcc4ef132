//! Both carrier-sense protocols, layered on [`AirModule`].
//!
//! # Legacy two-phase protocol
//!
//! The caller asks for a minimum free time and a variable window.  Phase
//! one waits `min_free`; on wake-up the trailing `[now − min_free, now)`
//! guard is checked against the covering interference and arrival envelopes
//! (a decodable signal is a carrier too) and the check reschedules itself
//! until the medium really has been quiet that long.  Phase two opens a
//! `var_free` window; interference intersecting the open window aborts it
//! with "carrier detected" (rollover), an undisturbed window resolves "no
//! carrier".  Each window carries an id, so an aborted window's end
//! envelope cannot resolve a window opened later.
//!
//! # Generic registration protocol
//!
//! A registration carries a duration and two independent flags: `negative`
//! senses for the channel becoming free instead of busy, `virtual_sense`
//! counts the node's own outgoing transmission as busy instead of
//! rejecting the request while sending.  Resolution removes the entry from
//! the unfinished list, so any envelope still in flight for it lands as a
//! no-op — the queue itself has no cancellation primitive.

use log::debug;

use wsim_core::Interval;
use wsim_event::{CarrierSenseInformation, CarrierSenseOutcome, Event};
use wsim_packet::Address;

use crate::air::{AirAction, AirCtx, AirError, AirModule, AirResult, LegacyWindow};

impl AirModule {
    // ── Legacy two-phase protocol ─────────────────────────────────────────

    /// Entry point for the legacy protocol: schedule the first min-free
    /// check.  The rest of the state machine runs through the queue.
    pub fn perform_carrier_sense(
        &mut self,
        registrant:    Address,
        min_free_secs: f64,
        var_free_secs: f64,
    ) -> Vec<AirAction> {
        vec![AirAction::Schedule {
            delay: min_free_secs,
            event: Event::PerformCarrierSense { registrant, min_free_secs, var_free_secs },
        }]
    }

    /// Min-free phase wake-up: either the medium has been quiet for the
    /// whole trailing guard and the variable window opens, or we reschedule
    /// for the earliest instant the guard can possibly pass.
    pub(crate) fn legacy_check(
        &mut self,
        ctx:           &AirCtx<'_>,
        registrant:    Address,
        min_free_secs: f64,
        var_free_secs: f64,
        actions:       &mut Vec<AirAction>,
    ) {
        let guard = Interval::new(ctx.now.after(-min_free_secs), min_free_secs);
        let busy_end = [self.last_interference_span(), self.last_arrival_span()]
            .into_iter()
            .flatten()
            .filter(|span| span.intersects(&guard))
            .map(|span| span.end())
            .max();
        if let Some(end) = busy_end {
            let wait = end.after(min_free_secs).since(ctx.now);
            debug!(
                "node {}: medium busy within min-free guard, retrying in {wait:.6}s",
                self.node()
            );
            actions.push(AirAction::Schedule {
                delay: wait.max(0.0),
                event: Event::PerformCarrierSense { registrant, min_free_secs, var_free_secs },
            });
            return;
        }

        let id = self.next_cs_id;
        self.next_cs_id += 1;
        self.cs_window = Some(LegacyWindow {
            interval: Interval::new(ctx.now, var_free_secs),
            registrant,
            id,
        });
        actions.push(AirAction::Schedule {
            delay: var_free_secs,
            event: Event::CarrierSenseWindowEnd { window_id: id },
        });
    }

    /// Variable window elapsed.  If the window was aborted by a rollover, or
    /// a later window replaced it, this envelope's id is dead and it does
    /// nothing.
    pub(crate) fn legacy_window_end(&mut self, window_id: u64, actions: &mut Vec<AirAction>) {
        match self.cs_window {
            Some(window) if window.id == window_id => {
                self.cs_window = None;
                actions.push(AirAction::Notify {
                    registrant: window.registrant,
                    outcome:    CarrierSenseOutcome::NoCarrier,
                });
            }
            _ => {}
        }
    }

    // ── Generic registration protocol ─────────────────────────────────────

    pub(crate) fn register(
        &mut self,
        ctx:      &AirCtx<'_>,
        mut info: CarrierSenseInformation,
        actions:  &mut Vec<AirAction>,
    ) {
        info.id = self.next_cs_id;
        self.next_cs_id += 1;

        // A physical sense cannot coexist with our own active transmission.
        if !info.virtual_sense && self.state().is_sending() {
            actions.push(AirAction::Notify {
                registrant: info.registrant,
                outcome:    CarrierSenseOutcome::Failed,
            });
            return;
        }

        if info.negative {
            self.unfinished.push(info);
            actions.push(AirAction::Schedule {
                delay: 0.0,
                event: Event::CarrierSenseFreeCheck { cs_id: info.id },
            });
            return;
        }

        let busy_now = self.interference_history().any_overlapping(ctx.now)
            || (info.virtual_sense && self.is_transmitting());
        if busy_now {
            actions.push(AirAction::Notify {
                registrant: info.registrant,
                outcome:    CarrierSenseOutcome::CarrierDetected,
            });
            return;
        }

        let cs_id = info.id;
        let duration = info.duration_secs;
        self.unfinished.push(info);
        actions.push(AirAction::Schedule {
            delay: duration,
            event: Event::CarrierSenseDurationEnd { cs_id },
        });
    }

    /// Requested duration elapsed without interference: regular sense
    /// resolves "no carrier".  No-op if already resolved.
    pub(crate) fn duration_end(&mut self, cs_id: u64, actions: &mut Vec<AirAction>) {
        if let Some(at) = self.unfinished.iter().position(|i| i.id == cs_id) {
            let info = self.unfinished.remove(at);
            actions.push(AirAction::Notify {
                registrant: info.registrant,
                outcome:    CarrierSenseOutcome::NoCarrier,
            });
        }
    }

    /// Negative-sense poll: resolve "no carrier" once nothing overlaps
    /// "now", otherwise reschedule for the instant the medium should clear.
    pub(crate) fn free_check(
        &mut self,
        ctx:     &AirCtx<'_>,
        cs_id:   u64,
        actions: &mut Vec<AirAction>,
    ) -> AirResult<()> {
        let Some(at) = self.unfinished.iter().position(|i| i.id == cs_id) else {
            return Ok(()); // already resolved
        };
        let info = self.unfinished[at];

        if self.state().is_sending() && !info.virtual_sense {
            return Err(AirError::NegativeSenseWhileSending { node: self.node(), cs_id });
        }

        let mut clear_at = self.interference_history().busy_until(ctx.now);
        if info.virtual_sense
            && let Some(own_end) = self.outgoing_end_if_active(ctx.now)
        {
            clear_at = Some(clear_at.map_or(own_end, |t| t.max(own_end)));
        }

        match clear_at {
            Some(when) => {
                actions.push(AirAction::Schedule {
                    delay: when.since(ctx.now).max(0.0),
                    event: Event::CarrierSenseFreeCheck { cs_id },
                });
            }
            None => {
                self.unfinished.remove(at);
                actions.push(AirAction::Notify {
                    registrant: info.registrant,
                    outcome:    CarrierSenseOutcome::NoCarrier,
                });
            }
        }
        Ok(())
    }

    /// Resolve pending registrations that cannot survive our own signal
    /// going on the air.  Virtual negative senses stay: the transmission
    /// simply counts as busy for them.
    pub(crate) fn resolve_senses_on_transmit(&mut self, actions: &mut Vec<AirAction>) {
        let mut i = 0;
        while i < self.unfinished.len() {
            let info = self.unfinished[i];
            if !info.virtual_sense {
                self.unfinished.remove(i);
                actions.push(AirAction::Notify {
                    registrant: info.registrant,
                    outcome:    CarrierSenseOutcome::Failed,
                });
            } else if !info.negative {
                self.unfinished.remove(i);
                actions.push(AirAction::Notify {
                    registrant: info.registrant,
                    outcome:    CarrierSenseOutcome::CarrierDetected,
                });
            } else {
                i += 1;
            }
        }
    }
}
