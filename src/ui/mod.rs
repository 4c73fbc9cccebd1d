pub mod headless;
pub mod render;
pub mod track;
pub mod visualizers;

pub use headless::HeadlessRenderer;
pub use render::TerminalRenderer;
