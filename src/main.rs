//! Boombox - audio-reactive terminal visualizer.
//!
//! Seven frequency bars and a gain dial that follow the microphone, or
//! drift on their own when no microphone is available.

mod app;
mod audio;
mod config;
mod engine;
mod telemetry;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use app::{App, AppOptions};
use telemetry::LogTarget;

/// Boombox - audio-reactive terminal visualizer
#[derive(Parser, Debug)]
#[command(name = "boombox")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Frames per second (1-240)
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Never request the microphone; animate on a random walk
    #[arg(long)]
    simulate: bool,

    /// Input device name (defaults to the system input device)
    #[arg(short, long)]
    device: Option<String>,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Seed for the simulated motion
    #[arg(long)]
    seed: Option<u64>,

    /// Print one line per frame instead of drawing the UI
    #[arg(long)]
    headless: bool,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Log file (defaults to the user data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_devices {
        let names = audio::microphone::input_device_names()?;
        if names.is_empty() {
            println!("No input devices found");
        }
        for name in names {
            println!("{}", name);
        }
        return Ok(());
    }

    let target = if args.headless {
        LogTarget::Stderr
    } else {
        LogTarget::File(args.log_file.as_deref())
    };
    let _log_guard = telemetry::init(target)?;

    let mut app = App::new(AppOptions {
        fps: args.fps,
        simulate: args.simulate,
        device: args.device,
        seed: args.seed,
        headless: args.headless,
        frames: args.frames,
    });
    app.run()?;

    Ok(())
}
