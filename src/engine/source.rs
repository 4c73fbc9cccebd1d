//! Where each tick's bar targets come from.

use rand::{Rng, RngCore};

use super::bars::{reduce_bars, Bars};
use super::gain::GainController;
use crate::audio::CaptureHandle;
use crate::config::BAR_MAX;

/// Which data path fed the latest frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Live,
    Simulated,
}

impl SourceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceMode::Live => "live",
            SourceMode::Simulated => "simulated",
        }
    }
}

/// Bounded random walk around the current bar levels.
pub struct RandomWalk {
    rng: Box<dyn RngCore + Send>,
    step: f32,
}

impl RandomWalk {
    pub fn new(rng: Box<dyn RngCore + Send>, step: f32) -> Self {
        Self { rng, step }
    }

    /// Perturb each current level by up to `step` in either direction.
    pub fn targets(&mut self, current: &Bars) -> Bars {
        let mut targets = *current;
        for target in targets.iter_mut() {
            let change = if self.step > 0.0 {
                self.rng.gen_range(-self.step..=self.step)
            } else {
                0.0
            };
            *target = (*target + change).clamp(0.0, BAR_MAX);
        }
        targets
    }
}

/// Input for the bar pipeline.
pub enum AudioSource {
    /// No capture; bars drift on a random walk.
    Simulated,
    /// Bars follow the reduced spectrum of a live input.
    Live(Box<dyn CaptureHandle>),
}

impl AudioSource {
    pub fn mode(&self) -> SourceMode {
        match self {
            AudioSource::Simulated => SourceMode::Simulated,
            AudioSource::Live(_) => SourceMode::Live,
        }
    }

    /// Produce this tick's bar targets. The live path runs the AGC and feeds
    /// the new gain back to the input; the simulated path leaves the gain
    /// untouched.
    pub fn next_targets(
        &mut self,
        current: &Bars,
        walk: &mut RandomWalk,
        agc: &mut GainController,
    ) -> Bars {
        match self {
            AudioSource::Simulated => walk.targets(current),
            AudioSource::Live(handle) => {
                let snapshot = handle.read_frame();
                let gain = agc.update(&snapshot);
                handle.set_gain(gain);
                reduce_bars(&snapshot)
            }
        }
    }

    /// Close the live input, if any. The source is simulated afterward.
    pub fn release(&mut self) {
        if let AudioSource::Live(mut handle) = std::mem::replace(self, AudioSource::Simulated) {
            handle.release();
        }
    }
}
