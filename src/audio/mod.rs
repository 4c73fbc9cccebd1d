pub mod analyzer;
pub mod capture;
pub mod microphone;

pub use capture::{CaptureHandle, CaptureProvider, PendingCapture};
pub use microphone::{DisabledProvider, MicrophoneProvider};
