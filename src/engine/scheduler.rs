//! Frame scheduling.
//!
//! An explicit loop at a fixed cadence: one engine tick per frame, handed
//! to the renderer, until the cancellation token fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info};

use super::pipeline::{Engine, Frame};
use crate::audio::CaptureProvider;

/// Receives each frame once it has been computed.
pub trait Renderer {
    fn render(&mut self, frame: &Frame) -> Result<()>;
}

/// Shared stop signal for the frame loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct AnimationScheduler {
    engine: Engine,
    frame_interval: Duration,
    frame_limit: Option<u64>,
    cancel: CancelToken,
}

impl AnimationScheduler {
    pub fn new(engine: Engine, fps: u32) -> Self {
        let fps = fps.clamp(1, 240);
        Self {
            engine,
            frame_interval: Duration::from_secs(1) / fps,
            frame_limit: None,
            cancel: CancelToken::new(),
        }
    }

    /// Stop on its own after `frames` frames.
    pub fn with_frame_limit(mut self, frames: Option<u64>) -> Self {
        self.frame_limit = frames;
        self
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Token that ends [`AnimationScheduler::run`] when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    #[cfg(test)]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Start the engine and drive it until cancelled, the frame limit is
    /// reached, or the renderer fails. The engine is stopped on every exit.
    pub fn run<R: Renderer>(&mut self, provider: &dyn CaptureProvider, renderer: &mut R) -> Result<()> {
        self.engine.start(provider);
        let result = self.run_loop(renderer);
        info!("leaving frame loop in {} mode", self.engine.mode().as_str());
        self.engine.stop();
        result
    }

    fn run_loop<R: Renderer>(&mut self, renderer: &mut R) -> Result<()> {
        let mut frames = 0u64;
        let mut next_frame = Instant::now();

        while !self.cancel.is_cancelled() {
            if self.frame_limit.is_some_and(|limit| frames >= limit) {
                debug!("frame limit reached after {} frames", frames);
                break;
            }

            let Some(frame) = self.engine.tick() else {
                break;
            };
            renderer.render(&frame)?;
            frames += 1;

            next_frame += self.frame_interval;
            let now = Instant::now();
            if next_frame > now {
                thread::sleep(next_frame - now);
            } else {
                // Fell behind; don't try to catch up with a burst of frames
                next_frame = now;
            }
        }
        Ok(())
    }
}
