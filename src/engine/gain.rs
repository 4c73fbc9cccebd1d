//! Automatic gain control.
//!
//! Steers the gain so the loudest bin of each snapshot tracks a fixed
//! target amplitude. Convergence is deliberately slow so the bars do not
//! pump with every transient.

use crate::config::{EngineConfig, INITIAL_GAIN};

#[derive(Debug, Clone)]
pub struct GainController {
    gain: f32,
    target_amplitude: f32,
    smoothing: f32,
    upper_clamp: f32,
}

impl GainController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            gain: INITIAL_GAIN,
            target_amplitude: config.agc_target_amplitude,
            smoothing: config.agc_smoothing,
            upper_clamp: config.gain_upper_clamp,
        }
    }

    /// Current gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Fold one snapshot into the gain and return the new value.
    ///
    /// A silent snapshot holds the gain where it is.
    pub fn update(&mut self, snapshot: &[u8]) -> f32 {
        let max_amplitude = snapshot.iter().copied().max().unwrap_or(0);
        let target = if max_amplitude > 0 {
            self.target_amplitude / f32::from(max_amplitude)
        } else {
            self.gain
        };
        let next = self.gain + self.smoothing * (target - self.gain);
        self.gain = next.min(self.upper_clamp);
        self.gain
    }

    pub(crate) fn reset(&mut self) {
        self.gain = INITIAL_GAIN;
    }
}
