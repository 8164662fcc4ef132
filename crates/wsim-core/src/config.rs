//! Top-level simulation configuration.
//!
//! Typically loaded from a TOML/JSON file by the application crate and passed
//! to the kernel builder.  All values are fixed for the duration of a run.

use crate::{WsimError, WsimResult};

/// Fixed run-wide constants consumed read-only during the simulation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// One-way signal latency between any sender and any receiver, seconds.
    pub propagation_delay_secs: f64,

    /// Simulated seconds after which the run halts normally (exclusive).
    pub horizon_secs: f64,

    /// Resolution used to convert user-facing step counts into seconds.
    pub steps_per_second: u32,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,
}

impl SimConfig {
    /// Seconds spanned by `steps` simulation steps at the configured rate.
    #[inline]
    pub fn secs_for_steps(&self, steps: u64) -> f64 {
        steps as f64 / self.steps_per_second as f64
    }

    /// Reject malformed configurations before the run starts.
    pub fn validate(&self) -> WsimResult<()> {
        if !self.propagation_delay_secs.is_finite() || self.propagation_delay_secs < 0.0 {
            return Err(WsimError::Config(format!(
                "propagation delay must be finite and non-negative, got {}",
                self.propagation_delay_secs
            )));
        }
        if !self.horizon_secs.is_finite() || self.horizon_secs <= 0.0 {
            return Err(WsimError::Config(format!(
                "simulation horizon must be finite and positive, got {}",
                self.horizon_secs
            )));
        }
        if self.steps_per_second == 0 {
            return Err(WsimError::Config("steps_per_second must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            propagation_delay_secs: 1e-6,
            horizon_secs:           60.0,
            steps_per_second:       1_000,
            seed:                   0,
        }
    }
}
