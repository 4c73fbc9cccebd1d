//! Application wiring and terminal lifecycle.

use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use crate::audio::{CaptureProvider, DisabledProvider, MicrophoneProvider};
use crate::config::EngineConfig;
use crate::engine::{AnimationScheduler, Engine};
use crate::ui::{HeadlessRenderer, TerminalRenderer};

/// Startup options collected from the command line.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub fps: u32,
    pub simulate: bool,
    pub device: Option<String>,
    pub seed: Option<u64>,
    pub headless: bool,
    pub frames: Option<u64>,
}

/// Main application state.
pub struct App {
    /// Frame loop driving the engine
    scheduler: AnimationScheduler,
    /// Where live input comes from
    provider: Box<dyn CaptureProvider>,
    /// Print frames instead of drawing them
    headless: bool,
}

impl App {
    pub fn new(options: AppOptions) -> Self {
        let engine = Engine::with_seed(EngineConfig::default(), options.seed);
        let scheduler = AnimationScheduler::new(engine, options.fps).with_frame_limit(options.frames);

        let provider: Box<dyn CaptureProvider> = if options.simulate {
            Box::new(DisabledProvider)
        } else {
            Box::new(MicrophoneProvider::new(options.device))
        };

        Self {
            scheduler,
            provider,
            headless: options.headless,
        }
    }

    /// Run the application.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "running at {:?} per frame{}",
            self.scheduler.frame_interval(),
            if self.headless { " (headless)" } else { "" }
        );

        if self.headless {
            return self.run_headless(io::stdout().lock());
        }

        // Setup terminal with cleanup guard
        enable_raw_mode()?;
        install_panic_hook();
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let mut renderer = TerminalRenderer::new(terminal, self.scheduler.cancel_token());

        // Run the frame loop, ensuring cleanup happens
        let result = self.scheduler.run(self.provider.as_ref(), &mut renderer);

        // Cleanup terminal (always do this, even if loop errored)
        let terminal = renderer.terminal_mut();
        let _ = disable_raw_mode();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        result
    }

    /// Run without a terminal UI, writing frame lines to `out`.
    fn run_headless<W: Write>(&mut self, out: W) -> Result<()> {
        let mut renderer = HeadlessRenderer::new(out);
        self.scheduler.run(self.provider.as_ref(), &mut renderer)
    }
}

/// Restore the terminal before the default panic output.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}
