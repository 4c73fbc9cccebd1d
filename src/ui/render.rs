//! UI rendering with ratatui.

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, Borders, Paragraph,
    },
    Frame as TuiFrame, Terminal,
};

use super::track::TrackTimer;
use super::visualizers::{format_time, mic_angle, pointer_tip, render_bars};
use crate::engine::{CancelToken, Frame, Renderer, SourceMode};

const PRIMARY_COLOR: Color = Color::Green;
const BAR_TOP: (f32, f32, f32) = (255.0, 255.0, 0.0);
const BAR_BOTTOM: (f32, f32, f32) = (255.0, 136.0, 0.0);

/// Draws frames into the terminal and watches for quit keys.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    cancel: CancelToken,
    track: TrackTimer,
}

impl TerminalRenderer {
    pub fn new(terminal: Terminal<CrosstermBackend<io::Stdout>>, cancel: CancelToken) -> Self {
        Self {
            terminal,
            cancel,
            track: TrackTimer::new(),
        }
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<io::Stdout>> {
        &mut self.terminal
    }

    /// Drain pending input without waiting.
    fn handle_events(&mut self) -> Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if is_quit_key(&key) {
                    self.cancel.cancel();
                }
            }
        }
        Ok(())
    }
}

/// `q`, `Esc` and `Ctrl-C` end the session.
fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        self.track.advance_to(Instant::now());
        let track = &self.track;
        self.terminal.draw(|f| render_ui(f, frame, track))?;
        self.handle_events()
    }
}

fn render_ui(f: &mut TuiFrame, frame: &Frame, track: &TrackTimer) {
    let area = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(1), // Spacer
            Constraint::Min(10),   // Boombox
            Constraint::Length(1), // Controls
        ])
        .split(area);

    render_header(f, rows[0], frame);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25), // Mic dial
            Constraint::Percentage(50), // Display
            Constraint::Percentage(25), // Gain dial
        ])
        .split(rows[2]);

    let live = frame.mode == SourceMode::Live;
    render_dial(
        f,
        columns[0],
        mic_angle(live),
        if live { "MIC: ON" } else { "MIC: OFF" },
        false,
    );
    render_display(f, columns[1], frame, track);
    render_dial(
        f,
        columns[2],
        frame.pointer_angle,
        &format!("GAIN: {:.1}", frame.gain),
        true,
    );

    render_controls(f, rows[3]);
}

fn render_header(f: &mut TuiFrame, area: Rect, frame: &Frame) {
    let (label, color) = match frame.mode {
        SourceMode::Live => ("[live]", PRIMARY_COLOR),
        SourceMode::Simulated => ("[simulated]", Color::Yellow),
    };
    let spans = vec![
        Span::styled("  Boombox", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", label), Style::default().fg(color)),
    ];
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_display(f: &mut TuiFrame, area: Rect, frame: &Frame, track: &TrackTimer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Time
            Constraint::Length(1), // Track
            Constraint::Length(1), // Spacer
            Constraint::Min(1),    // Bars
        ])
        .split(inner);

    let text_style = Style::default().fg(PRIMARY_COLOR).add_modifier(Modifier::BOLD);
    f.render_widget(
        Paragraph::new(Span::styled(format!(" {}", format_time(track.elapsed())), text_style)),
        parts[0],
    );
    f.render_widget(
        Paragraph::new(Span::styled(format!(" TRACK {}", track.number()), text_style)),
        parts[1],
    );

    let bar_area = parts[3];
    let width = bar_area.width.saturating_sub(2) as usize;
    let height = bar_area.height as usize;
    let lines = render_bars(&frame.bars, width, height);
    let bar_lines: Vec<Line> = lines
        .into_iter()
        .enumerate()
        .map(|(row, s)| {
            // Gradient from yellow (top) to orange (bottom)
            let t = row as f32 / height.max(1) as f32;
            let color = Color::Rgb(
                (BAR_TOP.0 + t * (BAR_BOTTOM.0 - BAR_TOP.0)) as u8,
                (BAR_TOP.1 + t * (BAR_BOTTOM.1 - BAR_TOP.1)) as u8,
                (BAR_TOP.2 + t * (BAR_BOTTOM.2 - BAR_TOP.2)) as u8,
            );
            Line::from(Span::styled(format!(" {}", s), Style::default().fg(color)))
        })
        .collect();
    f.render_widget(Paragraph::new(bar_lines), bar_area);
}

fn render_dial(f: &mut TuiFrame, area: Rect, angle: f32, label: &str, range_labels: bool) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let (tip_x, tip_y) = pointer_tip(angle, 0.85);
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([-1.2, 1.2])
        .y_bounds([-1.2, 1.2])
        .paint(move |ctx| {
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius: 1.0,
                color: Color::Gray,
            });
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius: 0.65,
                color: Color::DarkGray,
            });
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: 0.0,
                x2: tip_x,
                y2: tip_y,
                color: PRIMARY_COLOR,
            });
            if range_labels {
                ctx.print(-0.75, -0.75, Span::styled("0", Style::default().fg(Color::White)));
                ctx.print(0.6, -0.75, Span::styled("10", Style::default().fg(Color::White)));
            }
        });
    f.render_widget(canvas, parts[0]);

    f.render_widget(
        Paragraph::new(Span::styled(label.to_string(), Style::default().fg(Color::White)))
            .alignment(Alignment::Center),
        parts[1],
    );
}

fn render_controls(f: &mut TuiFrame, area: Rect) {
    let spans = vec![
        Span::styled("  [q]", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(" quit", Style::default().fg(Color::DarkGray)),
    ];
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;
    use ratatui::backend::TestBackend;

    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn screen(frame: &Frame) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let track = TrackTimer::new();
        terminal.draw(|f| render_ui(f, frame, &track)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn frame(mode: SourceMode, gain: f32) -> Frame {
        Frame {
            bars: [40.0; 7],
            gain,
            pointer_angle: 0.0,
            mode,
        }
    }

    #[test]
    fn test_quit_keys() {
        assert!(is_quit_key(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&key(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));

        assert!(!is_quit_key(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&key(KeyCode::Char(' '), KeyModifiers::NONE)));

        let mut release = key(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(!is_quit_key(&release));
    }

    #[test]
    fn test_simulated_labels() {
        let text = screen(&frame(SourceMode::Simulated, 1.0));
        assert!(text.contains("MIC: OFF"));
        assert!(text.contains("GAIN: 1.0"));
        assert!(text.contains("[simulated]"));
        assert!(text.contains("TRACK 1"));
    }

    #[test]
    fn test_live_labels() {
        let text = screen(&frame(SourceMode::Live, 7.26));
        assert!(text.contains("MIC: ON"));
        assert!(text.contains("GAIN: 7.3"));
        assert!(text.contains("[live]"));
    }
}
