//! Band reduction and VU-style smoothing.

use crate::config::{EngineConfig, BAND_COUNT, BAR_MAX};

/// Bar levels, each in 0..=BAR_MAX.
pub type Bars = [f32; BAND_COUNT];

/// Move `current` toward `target`, rising with `attack` and falling with
/// `decay`.
pub fn interpolate(current: f32, target: f32, attack: f32, decay: f32) -> f32 {
    let factor = if target > current { attack } else { decay };
    current + factor * (target - current)
}

/// Average a snapshot into `band_count` equal contiguous groups, scaled to
/// 0..=100. Samples past `band_count * (len / band_count)` are ignored; an
/// empty group averages to 0.
pub fn reduce(snapshot: &[u8], band_count: usize) -> Vec<f32> {
    if band_count == 0 {
        return Vec::new();
    }
    let group = snapshot.len() / band_count;
    if group == 0 {
        return vec![0.0; band_count];
    }

    snapshot
        .chunks_exact(group)
        .take(band_count)
        .map(|samples| {
            let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
            let average = sum as f32 / group as f32;
            average / 255.0 * BAR_MAX
        })
        .collect()
}

/// Fixed-size variant of [`reduce`] for the display's bar count.
pub fn reduce_bars(snapshot: &[u8]) -> Bars {
    let mut bars = [0.0; BAND_COUNT];
    for (bar, value) in bars.iter_mut().zip(reduce(snapshot, BAND_COUNT)) {
        *bar = value;
    }
    bars
}

/// Persistent bar levels with asymmetric attack/decay.
#[derive(Debug, Clone)]
pub struct BarSmoother {
    bars: Bars,
    attack: f32,
    decay: f32,
}

impl BarSmoother {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            bars: [0.0; BAND_COUNT],
            attack: config.attack,
            decay: config.decay,
        }
    }

    pub fn bars(&self) -> &Bars {
        &self.bars
    }

    /// Advance every bar one step toward its target.
    pub fn tick(&mut self, targets: &Bars) -> &Bars {
        for (bar, &target) in self.bars.iter_mut().zip(targets) {
            let next = interpolate(*bar, target, self.attack, self.decay);
            *bar = next.clamp(0.0, BAR_MAX);
        }
        &self.bars
    }

    pub(crate) fn reset(&mut self) {
        self.bars = [0.0; BAND_COUNT];
    }
}

/// Gain dial pointer, smoothed like a bar.
#[derive(Debug, Clone)]
pub struct PointerDial {
    angle: f32,
}

impl PointerDial {
    pub fn new() -> Self {
        Self { angle: 0.0 }
    }

    /// Steer the pointer toward the angle for `gain`.
    pub fn follow(&mut self, gain: f32, config: &EngineConfig) -> f32 {
        let target = config.gain_to_angle(gain);
        self.angle = interpolate(self.angle, target, config.attack, config.decay)
            .clamp(config.min_angle, config.max_angle);
        self.angle
    }

    pub(crate) fn reset(&mut self) {
        self.angle = 0.0;
    }
}

impl Default for PointerDial {
    fn default() -> Self {
        Self::new()
    }
}
