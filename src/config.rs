//! Tunable parameters of the visualization engine.

/// Number of frequency bars on the display.
pub const BAND_COUNT: usize = 7;

/// Analysis window size - must be power of 2
pub const FFT_SIZE: usize = 128;

/// Magnitude bins per snapshot (positive half of the transform).
pub const ANALYSIS_BIN_COUNT: usize = FFT_SIZE / 2;

/// Upper bound of a bar level.
pub const BAR_MAX: f32 = 100.0;

/// Gain shown before the AGC has ever run.
pub const INITIAL_GAIN: f32 = 1.0;

/// Smoothing and AGC parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Interpolation factor when a value rises toward its target
    pub attack: f32,
    /// Interpolation factor when a value falls toward its target
    pub decay: f32,
    /// Peak magnitude the AGC steers toward (byte scale)
    pub agc_target_amplitude: f32,
    /// Fraction of the distance to the target gain covered per tick
    pub agc_smoothing: f32,
    /// Hard ceiling for the gain
    pub gain_upper_clamp: f32,
    /// Maximum random walk excursion per tick in simulated mode
    pub random_walk_step: f32,
    /// Pointer angle at gain 0, in degrees
    pub min_angle: f32,
    /// Pointer angle at the gain ceiling, in degrees
    pub max_angle: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            attack: 0.3,
            decay: 0.1,
            agc_target_amplitude: 150.0,
            agc_smoothing: 0.05,
            gain_upper_clamp: 10.0,
            random_walk_step: 5.0,
            min_angle: -135.0,
            max_angle: 135.0,
        }
    }
}

impl EngineConfig {
    /// Map a gain value onto the dial's angular range.
    pub fn gain_to_angle(&self, gain: f32) -> f32 {
        let clamped = gain.clamp(0.0, self.gain_upper_clamp);
        (clamped / self.gain_upper_clamp) * (self.max_angle - self.min_angle) + self.min_angle
    }
}
