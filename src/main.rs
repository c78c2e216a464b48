mod cli;
mod config;
mod device;
mod middle;
mod tui;

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use cli::Args;
use config::{load_config, save_config};
use device::DeviceHandle;
use middle::{InputEvent, Middle};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let project_dir = args.project_dir();
    init_logging(&project_dir)?;

    let stored = load_config(&project_dir).unwrap_or_default();
    let config = args.overlay(&stored);
    tracing::info!(dir = %project_dir.display(), bpm = config.bpm, "starting");

    let devices = if args.no_audio {
        DeviceHandle::disconnected()
    } else {
        device::start_devices()
    };
    let mut middle = Middle::new(&config, &project_dir);

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let frame_rate = std::time::Duration::from_millis(16); // ~60fps
    let mut last_tick = Instant::now();
    let blink_start = Instant::now();

    loop {
        let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;
        let ds = middle.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, blink_on);
        })?;

        for event in tui::input::poll_input(frame_rate)? {
            if event == InputEvent::Quit {
                // settings as loaded, without this run's flags; the pattern is not kept
                if let Err(e) = save_config(&project_dir, &stored) {
                    tracing::warn!("could not save config: {e:#}");
                }
                drop(term);
                drop(devices);
                return Ok(());
            }
            for cmd in middle.handle_input(event) {
                devices.send(cmd);
            }
        }

        // mic -> recorder
        for block in devices.drain_captured() {
            middle.on_captured(&block);
        }
        if devices.poll_playback_finished() {
            middle.on_playback_finished();
        }

        let elapsed = last_tick.elapsed().as_secs_f64();
        last_tick = Instant::now();
        middle.tick(elapsed);
    }
}

// The TUI owns the terminal, so logs go to <project_dir>/.beatscope/beatscope.log.
fn init_logging(project_dir: &Path) -> anyhow::Result<()> {
    let path = config::log_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("could not open log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("beatscope=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
