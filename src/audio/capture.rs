//! Capture abstraction shared by the engine and the input backends.
//!
//! A capture request is answered at most once, from whatever thread the
//! backend chooses. The engine polls the answer once per tick and may
//! cancel the request at any time; an answer that arrives after
//! cancellation releases its handle immediately instead of reviving the
//! engine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::config::ANALYSIS_BIN_COUNT;

/// One frame of per-bin magnitudes on the byte scale.
pub type MagnitudeSnapshot = [u8; ANALYSIS_BIN_COUNT];

/// Reasons live capture could not be established.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device available")]
    NoDevice,
    #[error("input device '{0}' not found")]
    DeviceNotFound(String),
    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),
    #[error("failed to query input configuration: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
    #[error("capture disabled")]
    Disabled,
    #[error("capture request abandoned before it resolved")]
    Abandoned,
}

/// A live input obtained from a successful capture request.
pub trait CaptureHandle: Send {
    /// Latest snapshot; never blocks.
    fn read_frame(&mut self) -> MagnitudeSnapshot;

    /// Gain applied to the signal before it is measured.
    fn set_gain(&mut self, gain: f32);

    /// Close the underlying device. Called exactly once by the engine.
    fn release(&mut self);

    /// Human readable description for logs.
    fn describe(&self) -> String {
        String::from("input")
    }
}

pub type CaptureResult = Result<Box<dyn CaptureHandle>, CaptureError>;

/// Something that can be asked for a live input.
pub trait CaptureProvider {
    /// Start an asynchronous request. Must not block.
    fn request_capture(&self) -> PendingCapture;
}

enum Slot {
    Waiting,
    Ready(CaptureResult),
    Taken,
    Cancelled,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create a linked request/answer pair.
pub fn capture_channel() -> (CaptureRequest, PendingCapture) {
    let slot = Arc::new(Mutex::new(Slot::Waiting));
    (
        CaptureRequest {
            slot: Arc::clone(&slot),
            answered: false,
        },
        PendingCapture { slot },
    )
}

/// Backend side of a capture request.
pub struct CaptureRequest {
    slot: Arc<Mutex<Slot>>,
    answered: bool,
}

impl CaptureRequest {
    /// Deliver the outcome. If the engine already gave up on this request,
    /// a successful handle is released on the spot.
    pub fn resolve(mut self, result: CaptureResult) {
        self.answered = true;
        let mut slot = lock(&self.slot);
        if matches!(*slot, Slot::Waiting) {
            *slot = Slot::Ready(result);
            return;
        }
        drop(slot);
        if let Ok(mut handle) = result {
            debug!("capture resolved after cancellation, releasing {}", handle.describe());
            handle.release();
        }
    }
}

impl Drop for CaptureRequest {
    fn drop(&mut self) {
        if self.answered {
            return;
        }
        let mut slot = lock(&self.slot);
        if matches!(*slot, Slot::Waiting) {
            *slot = Slot::Ready(Err(CaptureError::Abandoned));
        }
    }
}

/// Engine side of a capture request.
pub struct PendingCapture {
    slot: Arc<Mutex<Slot>>,
}

impl PendingCapture {
    /// A request that has already been answered.
    pub fn resolved(result: CaptureResult) -> Self {
        let (request, pending) = capture_channel();
        request.resolve(result);
        pending
    }

    /// Take the outcome if it has arrived. Returns `None` while waiting and
    /// after the outcome has been taken once.
    pub fn poll(&self) -> Option<CaptureResult> {
        let mut slot = lock(&self.slot);
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(result) => Some(result),
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Give up on the request. A handle that already arrived but was never
    /// polled is released here; one that arrives later is released by
    /// [`CaptureRequest::resolve`].
    pub fn cancel(self) {
        let previous = std::mem::replace(&mut *lock(&self.slot), Slot::Cancelled);
        if let Slot::Ready(Ok(mut handle)) = previous {
            debug!("releasing unclaimed capture {}", handle.describe());
            handle.release();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeHandle;
    use super::*;

    #[test]
    fn test_poll_waits_then_yields_once() {
        let (request, pending) = capture_channel();
        assert!(pending.poll().is_none());

        request.resolve(Ok(Box::new(FakeHandle::new([0; ANALYSIS_BIN_COUNT]))));
        assert!(matches!(pending.poll(), Some(Ok(_))));
        assert!(pending.poll().is_none());
    }

    #[test]
    fn test_late_resolution_releases_handle() {
        let (request, pending) = capture_channel();
        pending.cancel();

        let handle = FakeHandle::new([0; ANALYSIS_BIN_COUNT]);
        let releases = Arc::clone(&handle.releases);
        request.resolve(Ok(Box::new(handle)));

        assert_eq!(FakeHandle::release_count(&releases), 1);
    }

    #[test]
    fn test_cancel_releases_unclaimed_handle() {
        let (request, pending) = capture_channel();
        let handle = FakeHandle::new([0; ANALYSIS_BIN_COUNT]);
        let releases = Arc::clone(&handle.releases);
        request.resolve(Ok(Box::new(handle)));

        pending.cancel();
        assert_eq!(FakeHandle::release_count(&releases), 1);
    }

    #[test]
    fn test_device_enumeration_error_keeps_cause() {
        let cause = cpal::DevicesError::BackendSpecific {
            err: cpal::BackendSpecificError {
                description: "host unreachable".into(),
            },
        };
        let error = CaptureError::from(cause);
        assert!(matches!(error, CaptureError::Devices(_)));
        assert!(error.to_string().contains("host unreachable"));
    }

    #[test]
    fn test_dropped_request_reports_abandoned() {
        let (request, pending) = capture_channel();
        drop(request);
        assert!(matches!(pending.poll(), Some(Err(CaptureError::Abandoned))));
    }
}
