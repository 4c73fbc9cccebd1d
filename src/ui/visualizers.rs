//! Bar and dial drawing for the boombox display.

use crate::config::BAR_MAX;

const BLOCKS: &[char] = &[' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render bars (0..=100) as rows of block glyphs, top row first.
pub fn render_bars(bars: &[f32], width: usize, height: usize) -> Vec<String> {
    let num_bars = bars.len();
    let bar_width = if num_bars > 0 {
        (width.saturating_sub(num_bars - 1)) / num_bars
    } else {
        1
    }
    .max(1);

    let mut lines = Vec::with_capacity(height);
    let row_height = 1.0 / height.max(1) as f32;

    for row in 0..height {
        let mut row_chars = String::with_capacity(width);
        let threshold = 1.0 - (row as f32 * row_height);

        for (i, &value) in bars.iter().enumerate() {
            let level = (value / BAR_MAX).clamp(0.0, 1.0);
            let ch = if level >= threshold {
                '█'
            } else if level >= threshold - row_height {
                let partial_idx = ((level - threshold + row_height)
                    * height as f32
                    * (BLOCKS.len() - 1) as f32) as usize;
                BLOCKS[partial_idx.min(BLOCKS.len() - 1)]
            } else {
                ' '
            };

            for _ in 0..bar_width {
                row_chars.push(ch);
            }
            if i < num_bars - 1 {
                row_chars.push(' ');
            }
        }
        lines.push(row_chars);
    }
    lines
}

/// Pointer tip for a dial of radius 1 rotated `degrees` clockwise from
/// straight up, in y-up coordinates.
pub fn pointer_tip(degrees: f32, length: f64) -> (f64, f64) {
    let radians = f64::from(degrees).to_radians();
    (length * radians.sin(), length * radians.cos())
}

/// Microphone dial position: hard right when live, hard left otherwise.
pub fn mic_angle(live: bool) -> f32 {
    if live {
        135.0
    } else {
        -135.0
    }
}

/// `MM:SS`
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
