//! Microphone capture via cpal.
//!
//! The input stream is opened and owned by a dedicated thread, since cpal
//! streams cannot move between threads on every platform. The real-time
//! callback only downmixes to mono and pushes into a lock-free ring buffer.
//! The thread parks until the handle is released, then drops the stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, Thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::*;
use tracing::{debug, info, warn};

use super::analyzer::SpectrumAnalyzer;
use super::capture::{
    capture_channel, CaptureError, CaptureHandle, CaptureProvider, CaptureRequest,
    MagnitudeSnapshot, PendingCapture,
};

/// Requests capture from the default (or a named) input device.
pub struct MicrophoneProvider {
    device_name: Option<String>,
}

impl MicrophoneProvider {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl CaptureProvider for MicrophoneProvider {
    fn request_capture(&self) -> PendingCapture {
        let (request, pending) = capture_channel();
        let device_name = self.device_name.clone();

        // A failed spawn drops the request, which answers it as abandoned
        let spawned = thread::Builder::new()
            .name("boombox-capture".into())
            .spawn(move || run_capture(device_name, request));
        if let Err(e) = spawned {
            warn!("failed to spawn capture thread: {}", e);
        }
        pending
    }
}

/// Provider used when capture is switched off.
pub struct DisabledProvider;

impl CaptureProvider for DisabledProvider {
    fn request_capture(&self) -> PendingCapture {
        PendingCapture::resolved(Err(CaptureError::Disabled))
    }
}

/// Names of all input devices on the default host.
pub fn input_device_names() -> anyhow::Result<Vec<String>> {
    let host = cpal::default_host();
    let names = host
        .input_devices()?
        .filter_map(|device| device.name().ok())
        .collect();
    Ok(names)
}

fn find_device(device_name: Option<&str>) -> Result<Device, CaptureError> {
    let host = cpal::default_host();
    match device_name {
        None => host.default_input_device().ok_or(CaptureError::NoDevice),
        Some(name) => host
            .input_devices()?
            .find(|device| device.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| CaptureError::DeviceNotFound(name.to_string())),
    }
}

/// Body of the capture thread.
fn run_capture(device_name: Option<String>, request: CaptureRequest) {
    let should_stop = Arc::new(AtomicBool::new(false));

    let opened = open_stream(device_name.as_deref()).and_then(|(stream, analyzer, label)| {
        stream.play()?;
        Ok((stream, analyzer, label))
    });

    let (stream, analyzer, label) = match opened {
        Ok(parts) => parts,
        Err(e) => {
            request.resolve(Err(e));
            return;
        }
    };

    info!("capturing from {}", label);
    let handle = MicrophoneHandle {
        analyzer,
        label,
        should_stop: Arc::clone(&should_stop),
        owner: thread::current(),
        released: false,
    };
    request.resolve(Ok(Box::new(handle)));

    while !should_stop.load(Ordering::SeqCst) {
        thread::park();
    }
    drop(stream);
    debug!("capture thread exiting");
}

fn open_stream(device_name: Option<&str>) -> Result<(Stream, SpectrumAnalyzer, String), CaptureError> {
    let device = find_device(device_name)?;
    let supported = device.default_input_config()?;
    let format = supported.sample_format();
    let config: StreamConfig = supported.config();

    let mut analyzer = SpectrumAnalyzer::new();
    let producer = analyzer.create_buffer();

    let stream = match format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, producer)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, producer)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, producer)?,
        other => return Err(CaptureError::UnsupportedFormat(other)),
    };

    let label = format!(
        "'{}' ({} Hz, {} ch, {:?})",
        device.name().unwrap_or_else(|_| "unknown".into()),
        config.sample_rate.0,
        config.channels,
        format
    );
    Ok((stream, analyzer, label))
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut producer: ringbuf::HeapProd<f32>,
) -> Result<Stream, CaptureError>
where
    T: SizedSample,
    f32: cpal::FromSample<T>,
{
    let channels = config.channels.max(1) as usize;

    // CRITICAL: This callback runs in a real-time audio thread.
    // It MUST NEVER: allocate, lock mutexes, log, panic, or block.
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            for frame in data.chunks(channels) {
                let sum: f32 = frame
                    .iter()
                    .map(|&s| <f32 as cpal::FromSample<T>>::from_sample_(s))
                    .sum();
                // Overflow means the UI fell behind; dropping is fine
                let _ = producer.try_push(sum / frame.len() as f32);
            }
        },
        |err| warn!("input stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

/// Live handle to an open microphone stream.
pub struct MicrophoneHandle {
    analyzer: SpectrumAnalyzer,
    label: String,
    should_stop: Arc<AtomicBool>,
    owner: Thread,
    released: bool,
}

impl CaptureHandle for MicrophoneHandle {
    fn read_frame(&mut self) -> MagnitudeSnapshot {
        self.analyzer.snapshot()
    }

    fn set_gain(&mut self, gain: f32) {
        self.analyzer.set_gain(gain);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.should_stop.store(true, Ordering::SeqCst);
        self.owner.unpark();
        info!("released {}", self.label);
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

impl Drop for MicrophoneHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_provider_fails_immediately() {
        let pending = DisabledProvider.request_capture();
        assert!(matches!(pending.poll(), Some(Err(CaptureError::Disabled))));
    }
}
