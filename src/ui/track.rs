//! Cosmetic track counter shown on the display.

use std::time::{Duration, Instant};

use rand::Rng;

const MIN_TRACK_SECS: u32 = 120;
const MAX_TRACK_SECS: u32 = 180;

fn random_duration() -> u32 {
    rand::thread_rng().gen_range(MIN_TRACK_SECS..=MAX_TRACK_SECS)
}

pub struct TrackTimer {
    number: u32,
    elapsed: u32,
    duration: u32,
    last_second: Instant,
}

impl TrackTimer {
    pub fn new() -> Self {
        Self {
            number: 1,
            elapsed: 0,
            duration: random_duration(),
            last_second: Instant::now(),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Seconds into the current track.
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    #[cfg(test)]
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Catch up on every whole second that has passed since the last call.
    pub fn advance_to(&mut self, now: Instant) {
        while now.saturating_duration_since(self.last_second) >= Duration::from_secs(1) {
            self.last_second += Duration::from_secs(1);
            self.step();
        }
    }

    /// Advance by one second.
    fn step(&mut self) {
        self.elapsed += 1;
        if self.elapsed >= self.duration {
            self.number += 1;
            self.duration = random_duration();
            self.elapsed = 0;
        }
    }
}

impl Default for TrackTimer {
    fn default() -> Self {
        Self::new()
    }
}
