//! The concurrent loops that drive a session.
//!
//! Four long-lived threads share the session through `SharedSession` and
//! the terminal through `Terminal`:
//!
//! - **render**: redraws the panels, a full redraw only when requested
//! - **advance**: owns `SessionState`, completes phases, publishes snapshots
//! - **persist**: writes the save file once a second
//! - **input**: reads keys and signals, runs the modal dialogs
//!
//! Beeps run on short-lived threads of their own. The supervisor joins
//! the loops once each of them has reported finished.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::core::signals;
use crate::core::term::{Key, Screen, Terminal};
use crate::quotes::QuoteBook;
use crate::save::{SaveFile, SaveRecord};
use crate::session::state::{LoopKind, SessionState, SharedSession, Tone};
use crate::session::timer::unix_now;
use crate::ui::{confirm, Panels, Y_BORDER};

/// Idle sleep of every loop
pub const SLEEP_INTERVAL: Duration = Duration::from_millis(50);
/// Period of the save file writes
pub const SAVE_INTERVAL: Duration = Duration::from_millis(1000);
/// Period of the status window refresh
pub const STATUS_INTERVAL: Duration = Duration::from_millis(250);

const EXIT_QUESTION: &str = "Exit pomodoro?";
const SKIP_QUESTION: &str = "Do you want to skip the current session?";

/// Requests for the render loop, which owns the panels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    NewQuote,
    ToggleControls,
}

/// Everything a loop needs, cheap to clone into a thread
#[derive(Clone)]
struct LoopContext {
    terminal: Arc<Terminal>,
    shared: Arc<SharedSession>,
    quotes: Arc<QuoteBook>,
    save: SaveFile,
    /// React to SIGINT/SIGWINCH; off when input is scripted
    watch_signals: bool,
}

impl LoopContext {
    /// Sleep up to `total`, waking early once the session stops
    fn nap(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while self.shared.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(SLEEP_INTERVAL));
        }
    }
}

/// Marks a loop finished when it returns or unwinds
struct FinishGuard {
    shared: Arc<SharedSession>,
    kind: LoopKind,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.shared.mark_finished(self.kind);
    }
}

pub struct Scheduler {
    ctx: LoopContext,
}

impl Scheduler {
    pub fn new(terminal: Arc<Terminal>, shared: Arc<SharedSession>, quotes: QuoteBook, save: SaveFile) -> Self {
        Self {
            ctx: LoopContext {
                terminal,
                shared,
                quotes: Arc::new(quotes),
                save,
                watch_signals: true,
            },
        }
    }

    /// Run all loops until the user exits, then join them
    pub fn run(self, state: SessionState) -> io::Result<()> {
        let (tx, rx) = mpsc::channel::<UiCommand>();

        let advance_tx = tx.clone();
        let handles = vec![
            spawn_loop(LoopKind::Render, self.ctx.clone(), move |ctx| render_loop(ctx, rx))?,
            spawn_loop(LoopKind::Advance, self.ctx.clone(), move |ctx| {
                advance_loop(ctx, state, advance_tx)
            })?,
            spawn_loop(LoopKind::Persist, self.ctx.clone(), persist_loop)?,
            spawn_loop(LoopKind::Input, self.ctx.clone(), move |ctx| input_loop(ctx, tx))?,
        ];

        self.supervise(handles);
        Ok(())
    }

    fn supervise(&self, handles: Vec<JoinHandle<()>>) {
        while !self.ctx.shared.all_finished() {
            thread::sleep(SLEEP_INTERVAL);
        }
        for handle in handles {
            if handle.join().is_err() {
                error!("A session loop panicked");
            }
        }
        info!("All session loops finished");
    }
}

/// Start a named loop thread; a failing loop stops the whole session
fn spawn_loop<F>(kind: LoopKind, ctx: LoopContext, body: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce(&LoopContext) -> io::Result<()> + Send + 'static,
{
    thread::Builder::new()
        .name(format!("{}-loop", kind.name()))
        .spawn(move || {
            let _guard = FinishGuard {
                shared: ctx.shared.clone(),
                kind,
            };
            debug!("{} loop started", kind.name());
            if let Err(e) = body(&ctx) {
                error!("{} loop failed: {}", kind.name(), e);
                ctx.shared.stop();
            }
            debug!("{} loop finished", kind.name());
        })
}

fn render_loop(ctx: &LoopContext, commands: Receiver<UiCommand>) -> io::Result<()> {
    let shared = &ctx.shared;
    let mut panels = Panels::new(&ctx.quotes.random());
    let mut last_status: Option<Instant> = None;

    while shared.is_running() {
        for command in commands.try_iter() {
            match command {
                UiCommand::NewQuote => panels.set_quote(&ctx.quotes.random()),
                UiCommand::ToggleControls => {
                    panels.toggle_controls();
                }
            }
            shared.request_redraw();
        }

        if last_status.map_or(true, |at| at.elapsed() >= STATUS_INTERVAL) {
            last_status = Some(Instant::now());
            if panels.update_status(&shared.snapshot(), Local::now()) {
                shared.request_redraw();
            } else {
                ctx.terminal.frame(|screen| {
                    if shared.is_modal_open() {
                        return Ok(());
                    }
                    panels.render_status(screen)
                })?;
            }
        }

        if !shared.is_modal_open() && shared.take_redraw() {
            ctx.terminal
                .frame(|screen| redraw_all(shared, &mut panels, screen))?;
        }

        thread::sleep(SLEEP_INTERVAL);
    }
    Ok(())
}

/// Lay out and repaint every panel; the caller holds the terminal lock
fn redraw_all(shared: &SharedSession, panels: &mut Panels, screen: &mut Screen) -> io::Result<()> {
    // a dialog may have opened while waiting for the lock
    if shared.is_modal_open() {
        shared.request_redraw();
        return Ok(());
    }
    panels.layout(screen.query_size(), shared.is_paused());
    screen.clear_screen()?;
    panels.render_all(screen)
}

fn advance_loop(ctx: &LoopContext, mut state: SessionState, commands: Sender<UiCommand>) -> io::Result<()> {
    let shared = &ctx.shared;

    while shared.is_running() {
        let now = unix_now();
        state.set_paused(shared.is_paused(), now);

        let event = if shared.take_skip() {
            Some((state.advance(now), Tone::skipped()))
        } else {
            state
                .tick(now)
                .map(|transition| (transition, Tone::completed(transition.from)))
        };
        shared.publish(state.snapshot(now));

        if let Some((transition, tone)) = event {
            info!(
                "Phase {} finished, next: {}",
                transition.from.name(),
                transition.to.name()
            );
            let _ = commands.send(UiCommand::NewQuote);
            shared.request_redraw();
            spawn_beep(ctx.terminal.clone(), tone);
        }

        thread::sleep(SLEEP_INTERVAL);
    }
    Ok(())
}

/// Ring the bell on a detached thread, taking the lock once per beep
fn spawn_beep(terminal: Arc<Terminal>, tone: Tone) {
    let spawned = thread::Builder::new()
        .name("beep".to_string())
        .spawn(move || {
            for _ in 0..tone.repetitions {
                if let Err(e) = terminal.lock().beep() {
                    debug!("Beep failed: {}", e);
                    return;
                }
                thread::sleep(Duration::from_millis(tone.delay_ms()));
            }
        });
    if let Err(e) = spawned {
        warn!("Failed to start beep thread: {}", e);
    }
}

fn persist_loop(ctx: &LoopContext) -> io::Result<()> {
    let mut failing = false;

    while ctx.shared.is_running() {
        save_now(ctx, &mut failing);
        ctx.nap(SAVE_INTERVAL);
    }
    save_now(ctx, &mut failing);
    Ok(())
}

/// Write the latest snapshot, warning once per run of failures
fn save_now(ctx: &LoopContext, failing: &mut bool) {
    let record = SaveRecord::from_snapshot(&ctx.shared.snapshot(), Local::now().date_naive());
    match ctx.save.write(&record) {
        Ok(()) => *failing = false,
        Err(e) if !*failing => {
            warn!("Failed to write {}: {}", ctx.save.path().display(), e);
            *failing = true;
        }
        Err(_) => {}
    }
}

fn input_loop(ctx: &LoopContext, commands: Sender<UiCommand>) -> io::Result<()> {
    let shared = &ctx.shared;

    while shared.is_running() {
        if ctx.watch_signals {
            if signals::take_resize() {
                shared.request_redraw();
            }
            if signals::take_interrupt() {
                exit_flow(ctx)?;
                continue;
            }
        }

        let key = ctx.terminal.lock().poll_key()?;
        match key {
            Some(Key::Interrupt) => exit_flow(ctx)?,
            Some(Key::Char(c)) => match c.to_ascii_lowercase() {
                'p' => {
                    let paused = shared.toggle_pause();
                    info!("Timer {}", if paused { "paused" } else { "resumed" });
                    shared.request_redraw();
                }
                's' => skip_flow(ctx)?,
                'q' => {
                    let _ = commands.send(UiCommand::NewQuote);
                }
                'i' => {
                    let _ = commands.send(UiCommand::ToggleControls);
                }
                _ => {}
            },
            Some(_) => {}
            None => thread::sleep(SLEEP_INTERVAL),
        }
    }
    Ok(())
}

/// Clear the panels away and ask `question`
fn ask(ctx: &LoopContext, question: &str) -> io::Result<bool> {
    ctx.shared.set_modal_open(true);
    ctx.terminal.frame(|screen| screen.clear_screen())?;
    confirm(&ctx.terminal, question, Y_BORDER)
}

/// Remove the dialog and bring the panels back
fn close_modal(ctx: &LoopContext) -> io::Result<()> {
    ctx.terminal.frame(|screen| screen.clear_screen())?;
    ctx.shared.set_modal_open(false);
    ctx.shared.request_redraw();
    Ok(())
}

fn exit_flow(ctx: &LoopContext) -> io::Result<()> {
    if ask(ctx, EXIT_QUESTION)? {
        info!("Exit confirmed");
        ctx.shared.stop();
        Ok(())
    } else {
        close_modal(ctx)
    }
}

fn skip_flow(ctx: &LoopContext) -> io::Result<()> {
    let shared = &ctx.shared;
    let was_paused = shared.is_paused();
    shared.set_paused(true);

    let answer = ask(ctx, SKIP_QUESTION);
    if let Ok(true) = answer {
        info!("Skipping the current phase");
        shared.request_skip();
    }
    shared.set_paused(was_paused);
    close_modal(ctx)?;
    answer.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::core::term::{ScriptedInput, SharedBuffer, TermSize};
    use crate::quotes::Quote;
    use crate::session::phase::{PhaseCycle, PhaseKind};

    fn context(input: &[u8]) -> (LoopContext, SharedBuffer, tempfile::TempDir) {
        let buffer = SharedBuffer::new();
        let screen = Screen::new(Box::new(buffer.clone()), Box::new(ScriptedInput::new(input)));
        let state = SessionState::new(PhaseCycle::new(&Settings::default()), unix_now());
        let dir = tempfile::tempdir().unwrap();
        let ctx = LoopContext {
            terminal: Arc::new(Terminal::new(screen)),
            shared: Arc::new(SharedSession::new(state.snapshot(unix_now()))),
            quotes: Arc::new(QuoteBook::parse("only quote@~me\n")),
            save: SaveFile::new(dir.path().join("save")),
            watch_signals: false,
        };
        (ctx, buffer, dir)
    }

    #[test]
    fn test_input_keys() {
        let (ctx, _buffer, _dir) = context(b"pxqI");
        let (tx, rx) = mpsc::channel();

        let worker = {
            let ctx = ctx.clone();
            thread::spawn(move || input_loop(&ctx, tx))
        };
        let mut received = Vec::new();
        while received.len() < 2 {
            received.push(rx.recv_timeout(Duration::from_secs(5)).unwrap());
        }
        ctx.shared.stop();
        worker.join().unwrap().unwrap();

        assert_eq!(received, vec![UiCommand::NewQuote, UiCommand::ToggleControls]);
        assert!(ctx.shared.is_paused());
    }

    #[test]
    fn test_skip_dialog_restores_pause() {
        // Right selects YES
        let (ctx, buffer, _dir) = context(b"s\x1b[C\r");
        skip_flow_from_input(&ctx);

        assert!(ctx.shared.take_skip());
        assert!(!ctx.shared.is_paused());
        assert!(!ctx.shared.is_modal_open());
        assert!(ctx.shared.take_redraw());
        assert!(buffer.contents_lossy().contains("session?"));
    }

    #[test]
    fn test_skip_declined() {
        let (ctx, _buffer, _dir) = context(b"\r");
        ctx.shared.set_paused(true);
        skip_flow(&ctx).unwrap();
        assert!(!ctx.shared.take_skip());
        assert!(ctx.shared.is_paused());
    }

    fn skip_flow_from_input(ctx: &LoopContext) {
        let key = ctx.terminal.lock().poll_key().unwrap();
        assert_eq!(key, Some(Key::Char('s')));
        skip_flow(ctx).unwrap();
    }

    #[test]
    fn test_exit_flow() {
        let (ctx, _buffer, _dir) = context(b"\r");
        exit_flow(&ctx).unwrap();
        assert!(ctx.shared.is_running());
        assert!(!ctx.shared.is_modal_open());

        let (ctx, _buffer, _dir) = context(b"\x1b[C\r");
        exit_flow(&ctx).unwrap();
        assert!(!ctx.shared.is_running());
    }

    #[test]
    fn test_advance_loop_skips_phase() {
        let (ctx, _buffer, _dir) = context(b"");
        let (tx, rx) = mpsc::channel();
        ctx.shared.request_skip();

        let worker = {
            let ctx = ctx.clone();
            let state = SessionState::new(PhaseCycle::new(&Settings::default()), unix_now());
            thread::spawn(move || advance_loop(&ctx, state, tx))
        };
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), UiCommand::NewQuote);
        ctx.shared.stop();
        worker.join().unwrap().unwrap();

        let snapshot = ctx.shared.snapshot();
        assert_eq!(snapshot.phase, PhaseKind::ShortBreak);
        assert_eq!(snapshot.study_phase_count, 1);
    }

    #[test]
    fn test_persist_writes_snapshot() {
        let (ctx, _buffer, _dir) = context(b"");
        ctx.shared.stop();
        persist_loop(&ctx).unwrap();

        let record = ctx.save.read().unwrap();
        assert_eq!(record.date, Local::now().date_naive());
        assert_eq!(record.phase, PhaseKind::Study);
    }

    #[test]
    fn test_render_loop_draws_panels() {
        let (ctx, buffer, _dir) = context(b"");
        let (tx, rx) = mpsc::channel();
        let worker = {
            let ctx = ctx.clone();
            thread::spawn(move || render_loop(&ctx, rx))
        };
        tx.send(UiCommand::ToggleControls).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !buffer.contents_lossy().contains("only quote") && Instant::now() < deadline {
            thread::sleep(SLEEP_INTERVAL);
        }
        ctx.shared.stop();
        worker.join().unwrap().unwrap();

        let out = buffer.contents_lossy();
        assert!(out.contains("only quote"));
        assert!(out.contains("current phase: study [1/4]"));
    }

    #[test]
    fn test_modal_blocks_redraw() {
        let (ctx, buffer, _dir) = context(b"");
        ctx.shared.set_modal_open(true);
        let (_tx, rx) = mpsc::channel();
        let worker = {
            let ctx = ctx.clone();
            thread::spawn(move || render_loop(&ctx, rx))
        };
        thread::sleep(Duration::from_millis(400));
        ctx.shared.stop();
        worker.join().unwrap().unwrap();

        assert!(!buffer.contents_lossy().contains("current phase"));
        assert!(ctx.shared.take_redraw());
    }

    #[test]
    fn test_redraws_and_beeps_never_interleave() {
        const ROUNDS: usize = 1000;

        let buffer = SharedBuffer::new();
        let screen = Screen::new(Box::new(buffer.clone()), Box::new(ScriptedInput::default()))
            .with_fixed_size(TermSize { cols: 120, rows: 40 });
        let terminal = Arc::new(Terminal::new(screen));
        let (ctx, _, _dir) = context(b"");

        let beeps = {
            let terminal = terminal.clone();
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    spawn_beep(terminal.clone(), Tone { repetitions: 1, speed: 10 });
                }
            })
        };

        let mut panels = Panels::new(&Quote::fallback());
        panels.update_status(&ctx.shared.snapshot(), Local::now());
        for _ in 0..ROUNDS {
            terminal
                .frame(|screen| redraw_all(&ctx.shared, &mut panels, screen))
                .unwrap();
        }
        beeps.join().unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while buffer.contents_lossy().matches('\x07').count() < ROUNDS && Instant::now() < deadline {
            thread::sleep(SLEEP_INTERVAL);
        }

        let out = buffer.contents_lossy();
        assert_eq!(out.matches('\x07').count(), ROUNDS);

        let frames: Vec<&str> = out.split("\x1b[?2026h").skip(1).collect();
        assert_eq!(frames.len(), ROUNDS);
        for frame in frames {
            assert_eq!(frame.matches("\x1b[?2026l").count(), 1);
            let body = frame.split("\x1b[?2026l").next().unwrap_or_default();
            assert!(!body.contains('\x07'));
            assert_eq!(body.matches("current phase: study [1/4]").count(), 1);
            assert_eq!(body.matches("Well begun is half done.").count(), 1);
        }
    }

    #[test]
    fn test_supervisor_joins_all_loops() {
        let (ctx, _buffer, _dir) = context(b"");
        let scheduler = Scheduler { ctx: ctx.clone() };
        let state = SessionState::new(PhaseCycle::new(&Settings::default()), unix_now());

        let stopper = {
            let shared = ctx.shared.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(300));
                shared.stop();
            })
        };
        scheduler.run(state).unwrap();
        stopper.join().unwrap();

        assert!(ctx.shared.all_finished());
        assert!(ctx.save.path().exists());
    }
}
