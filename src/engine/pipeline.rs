//! The per-frame state engine.
//!
//! Owns every piece of state that carries from one frame to the next and
//! advances it by exactly one step per [`Engine::tick`].

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, warn};

use super::bars::{BarSmoother, Bars, PointerDial};
use super::gain::GainController;
use super::source::{AudioSource, RandomWalk, SourceMode};
use crate::audio::{CaptureProvider, PendingCapture};
use crate::config::EngineConfig;

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Starting,
    Running,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub bars: Bars,
    pub gain: f32,
    pub pointer_angle: f32,
    pub mode: SourceMode,
}

pub struct Engine {
    config: EngineConfig,
    state: EngineState,
    source: AudioSource,
    pending: Option<PendingCapture>,
    walk: RandomWalk,
    agc: GainController,
    bars: BarSmoother,
    pointer: PointerDial,
}

impl Engine {
    /// Create an engine whose random walk draws from `rng`.
    pub fn new(config: EngineConfig, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            walk: RandomWalk::new(rng, config.random_walk_step),
            agc: GainController::new(&config),
            bars: BarSmoother::new(&config),
            pointer: PointerDial::new(),
            source: AudioSource::Simulated,
            pending: None,
            state: EngineState::Stopped,
            config,
        }
    }

    /// Create an engine with a seeded (reproducible) or entropy-seeded walk.
    pub fn with_seed(config: EngineConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, Box::new(rng))
    }

    #[cfg(test)]
    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn mode(&self) -> SourceMode {
        self.source.mode()
    }

    #[cfg(test)]
    pub fn bars(&self) -> &Bars {
        self.bars.bars()
    }

    #[cfg(test)]
    pub fn gain(&self) -> f32 {
        self.agc.gain()
    }

    /// Begin a new run and ask `provider` for live input. Never fails: the
    /// engine animates in simulated mode until the request resolves.
    pub fn start(&mut self, provider: &dyn CaptureProvider) {
        if self.state != EngineState::Stopped {
            debug!("start ignored, engine is {:?}", self.state);
            return;
        }
        self.agc.reset();
        self.bars.reset();
        self.pointer.reset();
        self.source = AudioSource::Simulated;

        info!("engine starting, requesting capture");
        self.pending = Some(provider.request_capture());
        self.state = EngineState::Starting;
    }

    /// Run one pass of the pipeline. Returns `None` when stopped.
    pub fn tick(&mut self) -> Option<Frame> {
        match self.state {
            EngineState::Stopped => return None,
            EngineState::Starting => {
                debug!("first frame");
                self.state = EngineState::Running;
            }
            EngineState::Running => {}
        }

        self.poll_capture();

        let targets = self
            .source
            .next_targets(self.bars.bars(), &mut self.walk, &mut self.agc);
        self.bars.tick(&targets);
        let pointer_angle = self.pointer.follow(self.agc.gain(), &self.config);

        Some(Frame {
            bars: *self.bars.bars(),
            gain: self.agc.gain(),
            pointer_angle,
            mode: self.source.mode(),
        })
    }

    /// Switch to live input if the capture request has answered.
    fn poll_capture(&mut self) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        let Some(result) = pending.poll() else {
            return;
        };
        self.pending = None;

        match result {
            Ok(handle) => {
                info!("capture live: {}", handle.describe());
                self.source = AudioSource::Live(handle);
            }
            Err(e) => warn!("capture unavailable, staying simulated: {}", e),
        }
    }

    /// Stop the run. Releases live input, and makes any still outstanding
    /// capture request release its handle when it eventually resolves.
    pub fn stop(&mut self) {
        if self.state == EngineState::Stopped {
            return;
        }
        self.state = EngineState::Stopped;

        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.source.release();
        info!("engine stopped");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::audio::capture::testing::{DeniedProvider, FakeHandle, ManualProvider};
    use crate::config::{BAND_COUNT, BAR_MAX};

    fn engine() -> Engine {
        Engine::with_seed(EngineConfig::default(), Some(11))
    }

    fn in_range(frame: &Frame) -> bool {
        frame.bars.iter().all(|b| (0.0..=BAR_MAX).contains(b))
            && (0.0..=10.0).contains(&frame.gain)
            && (-135.0..=135.0).contains(&frame.pointer_angle)
    }

    #[test]
    fn test_stopped_engine_does_not_tick() {
        let mut engine = engine();
        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(engine.tick().is_none());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut engine = engine();
        let provider = ManualProvider::default();

        engine.start(&provider);
        assert_eq!(engine.state(), EngineState::Starting);

        assert!(engine.tick().is_some());
        assert_eq!(engine.state(), EngineState::Running);

        engine.stop();
        assert_eq!(engine.state(), EngineState::Stopped);
        assert!(engine.tick().is_none());
    }

    #[test]
    fn test_denied_capture_stays_simulated_and_animates() {
        let mut engine = engine();
        engine.start(&DeniedProvider);

        let mut seen = Vec::new();
        for _ in 0..500 {
            let frame = engine.tick().expect("running engine yields frames");
            assert_eq!(frame.mode, SourceMode::Simulated);
            assert!(in_range(&frame));
            seen.push(frame.bars);
        }
        assert!(seen.windows(2).any(|w| w[0] != w[1]));
        // Gain stays frozen at its initial value
        assert_eq!(engine.gain(), 1.0);
    }

    #[test]
    fn test_switches_live_on_tick_after_resolution() {
        let mut engine = engine();
        let provider = ManualProvider::default();
        engine.start(&provider);

        for _ in 0..3 {
            assert_eq!(engine.tick().unwrap().mode, SourceMode::Simulated);
        }

        provider.answer(Ok(Box::new(FakeHandle::new([255; 64]))));
        let frame = engine.tick().unwrap();
        assert_eq!(frame.mode, SourceMode::Live);
        assert!(frame.gain < 1.0);

        for _ in 0..200 {
            let frame = engine.tick().unwrap();
            assert_eq!(frame.mode, SourceMode::Live);
            assert!(in_range(&frame));
        }
        // Full-scale input drives every bar to the top
        assert!(engine.bars().iter().all(|&b| (b - BAR_MAX).abs() < 1e-2));
    }

    #[test]
    fn test_live_input_extremes_stay_in_range() {
        let mut engine = engine();
        let provider = ManualProvider::default();
        engine.start(&provider);
        let mut quiet = [0u8; 64];
        quiet[5] = 1;
        provider.answer(Ok(Box::new(FakeHandle::new(quiet))));

        for _ in 0..1000 {
            assert!(in_range(&engine.tick().unwrap()));
        }
        assert!(engine.gain() <= 10.0);
    }

    #[test]
    fn test_stop_releases_live_handle_once() {
        let mut engine = engine();
        let provider = ManualProvider::default();
        engine.start(&provider);

        let handle = FakeHandle::new([100; 64]);
        let releases = Arc::clone(&handle.releases);
        provider.answer(Ok(Box::new(handle)));
        engine.tick();

        engine.stop();
        engine.stop();
        drop(engine);
        assert_eq!(FakeHandle::release_count(&releases), 1);
    }

    #[test]
    fn test_stop_before_resolution_releases_late_handle() {
        let mut engine = engine();
        let provider = ManualProvider::default();
        engine.start(&provider);
        engine.tick();
        engine.stop();

        let handle = FakeHandle::new([100; 64]);
        let releases = Arc::clone(&handle.releases);
        provider.answer(Ok(Box::new(handle)));

        assert_eq!(FakeHandle::release_count(&releases), 1);
        assert!(engine.tick().is_none());
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.mode(), SourceMode::Simulated);
    }

    #[test]
    fn test_stop_with_unpolled_answer_releases_it() {
        let mut engine = engine();
        let provider = ManualProvider::default();
        engine.start(&provider);

        let handle = FakeHandle::new([100; 64]);
        let releases = Arc::clone(&handle.releases);
        provider.answer(Ok(Box::new(handle)));
        engine.stop();

        assert_eq!(FakeHandle::release_count(&releases), 1);
    }

    #[test]
    fn test_restart_begins_fresh_run() {
        let mut engine = engine();
        engine.start(&DeniedProvider);
        for _ in 0..20 {
            engine.tick();
        }
        engine.stop();

        let provider = ManualProvider::default();
        engine.start(&provider);
        assert_eq!(engine.bars(), &[0.0; BAND_COUNT]);
        assert_eq!(engine.mode(), SourceMode::Simulated);
        provider.answer(Ok(Box::new(FakeHandle::new([150; 64]))));
        assert_eq!(engine.tick().unwrap().mode, SourceMode::Live);
    }

    #[test]
    fn test_start_while_running_is_ignored() {
        let mut engine = engine();
        let provider = ManualProvider::default();
        engine.start(&provider);
        engine.tick();

        engine.start(&DeniedProvider);
        assert_eq!(engine.state(), EngineState::Running);
        // The original request is still the one being waited on
        provider.answer(Ok(Box::new(FakeHandle::new([150; 64]))));
        assert_eq!(engine.tick().unwrap().mode, SourceMode::Live);
    }
}
