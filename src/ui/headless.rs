//! Plain-text renderer for runs without a terminal UI.

use std::io::Write;

use anyhow::Result;

use crate::engine::{Frame, Renderer};

/// Writes one line per frame.
pub struct HeadlessRenderer<W: Write> {
    out: W,
}

impl<W: Write> HeadlessRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn format_frame(frame: &Frame) -> String {
    let bars: Vec<String> = frame.bars.iter().map(|b| format!("{:.1}", b)).collect();
    format!(
        "mode={} gain={:.2} angle={:.1} bars={}",
        frame.mode.as_str(),
        frame.gain,
        frame.pointer_angle,
        bars.join(",")
    )
}

impl<W: Write> Renderer for HeadlessRenderer<W> {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        writeln!(self.out, "{}", format_frame(frame))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SourceMode;

    #[test]
    fn test_line_format() {
        let frame = Frame {
            bars: [0.0, 12.34, 50.0, 100.0, 1.0, 2.0, 3.0],
            gain: 1.0,
            pointer_angle: -10.8,
            mode: SourceMode::Simulated,
        };
        let mut renderer = HeadlessRenderer::new(Vec::new());
        renderer.render(&frame).unwrap();

        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            text,
            "mode=simulated gain=1.00 angle=-10.8 bars=0.0,12.3,50.0,100.0,1.0,2.0,3.0\n"
        );
    }
}
