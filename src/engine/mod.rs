pub mod bars;
pub mod gain;
pub mod pipeline;
pub mod scheduler;
pub mod source;

pub use pipeline::{Engine, Frame};
pub use scheduler::{AnimationScheduler, CancelToken, Renderer};
pub use source::SourceMode;
