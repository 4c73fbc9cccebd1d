//! Spectrum analysis for visualization using FFT.
//!
//! Produces byte-scaled magnitude snapshots the same way a browser
//! analyser node does: Blackman window, per-bin temporal smoothing, and a
//! decibel range mapped onto 0..=255.

use std::collections::VecDeque;
use std::sync::Arc;

use ringbuf::{traits::*, HeapRb};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::capture::MagnitudeSnapshot;
use crate::config::{ANALYSIS_BIN_COUNT, FFT_SIZE};

/// Analysis ring buffer size - enough for a few frames of input at 48 kHz
pub const ANALYSIS_BUFFER_SIZE: usize = 8192;

/// Weight of the previous frame in the per-bin smoothing
const SMOOTHING_TIME_CONSTANT: f32 = 0.8;

/// Decibel range mapped onto the byte scale
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Cap on samples drained per frame so a stalled UI never spins here
const MAX_SAMPLES_PER_UPDATE: usize = ANALYSIS_BUFFER_SIZE;

/// Analyzer turning mono samples into magnitude snapshots.
pub struct SpectrumAnalyzer {
    /// Ring buffer consumer fed by the input callback
    consumer: Option<ringbuf::HeapCons<f32>>,
    /// Latest FFT_SIZE samples
    window: VecDeque<f32>,
    /// Precomputed Blackman coefficients
    blackman: Vec<f32>,
    /// FFT working buffer
    fft_buffer: Vec<Complex<f32>>,
    /// FFT plan
    fft: Arc<dyn Fft<f32>>,
    /// Smoothed linear magnitudes
    smoothed: [f32; ANALYSIS_BIN_COUNT],
    /// Input gain applied before windowing
    gain: f32,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        Self {
            consumer: None,
            window: std::iter::repeat(0.0).take(FFT_SIZE).collect(),
            blackman: blackman_window(FFT_SIZE),
            fft_buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            fft,
            smoothed: [0.0; ANALYSIS_BIN_COUNT],
            gain: 1.0,
        }
    }

    /// Create a new sample buffer and return the producer for the input
    /// callback. The analyzer consumes from the new buffer.
    pub fn create_buffer(&mut self) -> ringbuf::HeapProd<f32> {
        let ring = HeapRb::<f32>::new(ANALYSIS_BUFFER_SIZE);
        let (producer, consumer) = ring.split();
        self.consumer = Some(consumer);
        producer
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Append samples to the sliding window, keeping only the newest.
    #[cfg(test)]
    pub fn push_samples(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.push(sample);
        }
    }

    fn push(&mut self, sample: f32) {
        if self.window.len() == FFT_SIZE {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    /// Drain whatever the input callback has produced so far.
    fn drain(&mut self) {
        let mut drained = 0;
        while drained < MAX_SAMPLES_PER_UPDATE {
            let Some(sample) = self.consumer.as_mut().and_then(|c| c.try_pop()) else {
                break;
            };
            self.push(sample);
            drained += 1;
        }
    }

    /// Drain pending input and analyze the current window.
    pub fn snapshot(&mut self) -> MagnitudeSnapshot {
        self.drain();

        for (i, (slot, &sample)) in self.fft_buffer.iter_mut().zip(self.window.iter()).enumerate() {
            *slot = Complex::new(sample * self.gain * self.blackman[i], 0.0);
        }
        self.fft.process(&mut self.fft_buffer);

        let mut frame = [0u8; ANALYSIS_BIN_COUNT];
        for (bin, byte) in frame.iter_mut().enumerate() {
            let magnitude = self.fft_buffer[bin].norm() / FFT_SIZE as f32;
            let smoothed = SMOOTHING_TIME_CONSTANT * self.smoothed[bin]
                + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;
            // Keep the filter state finite if the input ever was not
            self.smoothed[bin] = if smoothed.is_finite() { smoothed } else { 0.0 };
            *byte = magnitude_to_byte(self.smoothed[bin]);
        }
        frame
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let alpha = 0.16;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    (0..size)
        .map(|i| {
            let x = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
        })
        .collect()
}

/// Map a linear magnitude onto the byte scale through the decibel range.
fn magnitude_to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (db - MIN_DECIBELS) * 255.0 / (MAX_DECIBELS - MIN_DECIBELS);
    scaled.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use ringbuf::traits::Producer;

    use super::*;

    fn tone(bin: usize, amplitude: f32) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * bin as f32 * i as f32 / FFT_SIZE as f32).sin()
            })
            .collect()
    }

    #[test]
    fn test_silence_is_all_zero() {
        let mut analyzer = SpectrumAnalyzer::new();
        let frame = analyzer.snapshot();
        assert!(frame.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.push_samples(&tone(8, 1.0));
        let frame = analyzer.snapshot();

        assert_eq!(frame[8], 255);
        assert!(frame[8] >= frame[7]);
        assert!(frame[8] >= frame[9]);
        assert_eq!(frame[40], 0);
    }

    #[test]
    fn test_zero_gain_mutes_input() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.push_samples(&tone(8, 1.0));
        analyzer.set_gain(0.0);
        let frame = analyzer.snapshot();
        assert!(frame.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_ring_buffer_feeds_window() {
        let mut analyzer = SpectrumAnalyzer::new();
        let mut producer = analyzer.create_buffer();
        for sample in tone(16, 1.0) {
            let _ = producer.try_push(sample);
        }
        let frame = analyzer.snapshot();
        assert_eq!(frame[16], 255);
    }

    #[test]
    fn test_magnitude_to_byte_range() {
        assert_eq!(magnitude_to_byte(0.0), 0);
        // -100 dB and below clamp to 0
        assert_eq!(magnitude_to_byte(1e-6), 0);
        // -30 dB and above clamp to 255
        assert_eq!(magnitude_to_byte(1.0), 255);
        // -65 dB is the middle of the range
        let mid = magnitude_to_byte(10f32.powf(-65.0 / 20.0));
        assert!((126..=128).contains(&mid));
    }
}
