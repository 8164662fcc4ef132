//! Propagation models: who hears what, and how loudly.

use rand_distr::{Distribution, Normal};
use wsim_core::{Position, SimRng};
use wsim_packet::Reachability;

/// Free-space path loss at the 1 m reference distance, dB.  Roughly correct
/// for sub-GHz ISM bands; models that care override it.
const DEFAULT_REFERENCE_LOSS_DB: f64 = 40.0;

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Pluggable propagation/path-loss oracle.
///
/// The kernel queries this once per (sender, other-node) pair per
/// transmission and treats the result as opaque.  `reachable` and
/// `interfering` are independent flags; the broadcast loop branches on each
/// separately, so a model setting both is honored on both paths.
///
/// Implementations draw any stochastic terms (shadowing, fading) from the
/// supplied kernel RNG so runs stay replay-deterministic for a fixed seed.
pub trait PhysicalModel {
    fn reachability(
        &self,
        receiver:   Position,
        sender:     Position,
        signal_dbm: f64,
        rng:        &mut SimRng,
    ) -> Reachability;
}

// ── UnitDiskModel ─────────────────────────────────────────────────────────────

/// The classic two-radius disk: decodable inside `reach_radius_m`,
/// detectable-but-garbled out to `interference_radius_m`, silent beyond.
///
/// Deterministic; the reported signal strength is a plain free-space
/// estimate for diagnostics only.
#[derive(Clone, Debug)]
pub struct UnitDiskModel {
    pub reach_radius_m:        f64,
    pub interference_radius_m: f64,
}

impl UnitDiskModel {
    /// `interference_radius_m` is clamped up to at least the reach radius.
    pub fn new(reach_radius_m: f64, interference_radius_m: f64) -> Self {
        Self {
            reach_radius_m,
            interference_radius_m: interference_radius_m.max(reach_radius_m),
        }
    }
}

impl PhysicalModel for UnitDiskModel {
    fn reachability(
        &self,
        receiver:   Position,
        sender:     Position,
        signal_dbm: f64,
        _rng:       &mut SimRng,
    ) -> Reachability {
        let distance_m = receiver.distance_m(sender);
        let rssi = signal_dbm - path_loss_db(distance_m, 2.0, DEFAULT_REFERENCE_LOSS_DB);
        Reachability {
            reachable:   distance_m <= self.reach_radius_m,
            interfering: distance_m > self.reach_radius_m
                && distance_m <= self.interference_radius_m,
            signal_dbm:  rssi,
            distance_m,
        }
    }
}

// ── LogDistanceModel ──────────────────────────────────────────────────────────

/// Log-distance path loss with optional log-normal shadowing.
///
/// ```text
/// PL(d)  = PL(d0) + 10 · n · log10(d / d0) + N(0, σ)      (d0 = 1 m)
/// RSSI   = P_tx − PL(d)
/// ```
///
/// A signal is decodable when its RSSI clears `receive_sensitivity_dbm` and
/// interference-relevant (but not decodable) when it clears only
/// `interference_floor_dbm`.  The two thresholds make the flags mutually
/// exclusive by construction.
#[derive(Clone, Debug)]
pub struct LogDistanceModel {
    pub path_loss_exponent:        f64,
    pub reference_loss_db:         f64,
    /// Standard deviation of the shadowing term, dB.  Zero disables sampling.
    pub shadowing_sigma_db:        f64,
    pub receive_sensitivity_dbm:   f64,
    pub interference_floor_dbm:    f64,
}

impl LogDistanceModel {
    /// Suburban-ish defaults: exponent 3.0, no shadowing, −100 dBm receive
    /// sensitivity, −110 dBm interference floor.
    pub fn new() -> Self {
        Self {
            path_loss_exponent:      3.0,
            reference_loss_db:       DEFAULT_REFERENCE_LOSS_DB,
            shadowing_sigma_db:      0.0,
            receive_sensitivity_dbm: -100.0,
            interference_floor_dbm:  -110.0,
        }
    }

    /// Deterministic RSSI without the shadowing term, for range estimation.
    pub fn mean_rssi_dbm(&self, distance_m: f64, signal_dbm: f64) -> f64 {
        signal_dbm - path_loss_db(distance_m, self.path_loss_exponent, self.reference_loss_db)
    }
}

impl Default for LogDistanceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicalModel for LogDistanceModel {
    fn reachability(
        &self,
        receiver:   Position,
        sender:     Position,
        signal_dbm: f64,
        rng:        &mut SimRng,
    ) -> Reachability {
        let distance_m = receiver.distance_m(sender);
        let mut rssi = self.mean_rssi_dbm(distance_m, signal_dbm);

        if self.shadowing_sigma_db > 0.0 {
            // Normal::new only fails for non-finite sigma, excluded above.
            if let Ok(normal) = Normal::new(0.0, self.shadowing_sigma_db) {
                rssi -= normal.sample(rng.inner());
            }
        }

        let reachable = rssi >= self.receive_sensitivity_dbm;
        Reachability {
            reachable,
            interfering: !reachable && rssi >= self.interference_floor_dbm,
            signal_dbm: rssi,
            distance_m,
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Log-distance path loss in dB, anchored at a 1 m reference distance.
/// Distances under the reference collapse to the reference loss.
fn path_loss_db(distance_m: f64, exponent: f64, reference_loss_db: f64) -> f64 {
    if distance_m < 1.0 {
        return reference_loss_db;
    }
    reference_loss_db + 10.0 * exponent * distance_m.log10()
}
