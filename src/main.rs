//! pomoterm - A study/break session timer for the terminal
//!
//! pomoterm alternates study phases with short breaks, and every few study
//! phases a long break, drawing its status in bordered ANSI windows.
//!
//! # Features
//!
//! - **Phase Cycle**: study / short break / long break with configurable lengths
//! - **Live Status**: elapsed time, time studied today, phase end time
//! - **Quotes**: a random quote per phase from `~/.pomoterm/quotes`
//! - **Resume**: today's session is offered for resume on startup
//! - **Pause and Skip**: pause the timer or skip the current phase
//!
//! # Quick Start
//!
//! ```text
//! pomoterm                 # Settings from ~/.pomoterm/settings.toml
//! pomoterm 25 5 15 4       # 25m study, 5m short break, 15m long break every 4
//! pomoterm reset           # Back to the defaults
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | p | Pause / resume |
//! | s | Skip the current phase |
//! | q | New quote |
//! | i | Hide / show the controls |
//! | Ctrl+C | Exit |

mod config;
mod core;
mod quotes;
mod save;
mod session;
mod ui;

use std::env;
use std::sync::Arc;

use chrono::Local;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::CliAction;
use crate::core::signals;
use crate::core::term::{RawMode, Screen, Terminal};
use crate::quotes::QuoteBook;
use crate::save::SaveFile;
use crate::session::timer::unix_now;
use crate::session::{PhaseCycle, Scheduler, SessionState, SharedSession};
use crate::ui::{confirm, Y_BORDER};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter
const LOG_ENV: &str = "POMOTERM_LOG";

fn print_version() {
    eprintln!("pomoterm {}", VERSION);
}

fn print_help() {
    eprintln!("pomoterm {} - A study/break session timer for the terminal", VERSION);
    eprintln!();
    eprintln!("Usage: pomoterm [STUDY [SHORT_BREAK [LONG_BREAK [SESSIONS]]]]");
    eprintln!("       pomoterm reset");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  STUDY                 Study phase length in minutes (default 45)");
    eprintln!("  SHORT_BREAK           Short break length in minutes (default 15)");
    eprintln!("  LONG_BREAK            Long break length in minutes (default 30)");
    eprintln!("  SESSIONS              Study phases before a long break (default 4, 0 = never)");
    eprintln!("  reset                 Discard saved settings and use the defaults");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  p                     Pause / resume the timer");
    eprintln!("  s                     Skip the current phase");
    eprintln!("  q                     Show a new quote");
    eprintln!("  i                     Hide / show the controls window");
    eprintln!("  Ctrl+C                Exit");
    eprintln!();
    eprintln!("Settings: ~/.pomoterm/settings.toml");
    eprintln!("Quotes:   ~/.pomoterm/quotes (one \"quote@author\" per line)");
    eprintln!("Log:      ~/.pomoterm/pomoterm.log (filter with {})", LOG_ENV);
}

/// Log to `~/.pomoterm/pomoterm.log`; stdout belongs to the UI
fn init_logging() {
    let log_path = config::app_dir().join("pomoterm.log");
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let overrides = match config::parse_args(&args) {
        Ok(CliAction::Run(overrides)) => overrides,
        Ok(CliAction::Help) => {
            print_help();
            return Ok(());
        }
        Ok(CliAction::Version) => {
            print_version();
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging();
    info!("pomoterm {} starting...", VERSION);

    let settings = config::load_settings(&overrides);
    let quotes = QuoteBook::load(&settings.quotes_path());
    let save = SaveFile::new(settings.save_path());

    let mut raw_mode = match RawMode::enter() {
        Ok(raw_mode) => raw_mode,
        Err(e) => {
            eprintln!("pomoterm needs an interactive terminal: {}", e);
            std::process::exit(1);
        }
    };
    signals::install()?;

    let terminal = Arc::new(Terminal::new(Screen::stdio()));
    terminal.frame(|screen| {
        screen.clear_screen()?;
        screen.hide_cursor()
    })?;

    let result = run(&terminal, &settings, quotes, save);

    // restore the terminal even when the session failed
    let cleanup = terminal.frame(|screen| {
        screen.reset_styles()?;
        screen.clear_screen()?;
        screen.show_cursor()?;
        screen.move_cursor(0, 0)
    });
    raw_mode.exit();

    result?;
    cleanup?;
    info!("pomoterm exited");
    Ok(())
}

fn run(terminal: &Arc<Terminal>, settings: &config::Settings, quotes: QuoteBook, save: SaveFile) -> anyhow::Result<()> {
    let resume = match save.load_for(Local::now().date_naive()) {
        Some(record) => confirm(terminal, "Previous session found. Continue?", Y_BORDER)?.then_some(record),
        None => None,
    };

    let cycle = PhaseCycle::new(settings);
    let now = unix_now();
    let state = match resume {
        Some(record) => {
            info!("Resuming {} phase from {}", record.phase.name(), save.path().display());
            SessionState::restore(cycle, &record, now)
        }
        None => SessionState::new(cycle, now),
    };

    let shared = Arc::new(SharedSession::new(state.snapshot(now)));
    Scheduler::new(terminal.clone(), shared, quotes, save).run(state)?;
    Ok(())
}
