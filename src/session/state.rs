//! Session state and the flags shared between loops.
//!
//! `SessionState` is owned by the advance loop alone. Everyone else sees
//! it through the `SessionSnapshot` published into `SharedSession` after
//! every tick, plus a handful of atomic flags.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::save::SaveRecord;
use crate::session::phase::{PhaseCycle, PhaseKind, Transition};
use crate::session::timer::PhaseTimer;

/// A beep request: `repetitions` beeps at `speed` (0-10, faster when higher)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub repetitions: u32,
    pub speed: u32,
}

impl Tone {
    /// Tone for completing a phase of `kind`
    pub fn completed(kind: PhaseKind) -> Self {
        if kind.is_study() {
            Tone { repetitions: 3, speed: 3 }
        } else {
            Tone { repetitions: 5, speed: 10 }
        }
    }

    /// Tone for a user-requested skip
    pub fn skipped() -> Self {
        Tone { repetitions: 1, speed: 10 }
    }

    /// Pause between beeps in milliseconds
    pub fn delay_ms(&self) -> u64 {
        let speed = f64::from(self.speed.min(10));
        ((1.0 - speed / 10.0) * 700.0 + 300.0) as u64
    }
}

/// Read-only view of the session for display and persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: PhaseKind,
    pub phase_minutes: u32,
    pub repetitions: u32,
    pub completed: u32,
    pub phase_elapsed: u64,
    pub study_elapsed: u64,
    pub study_phase_count: u32,
    pub started_at: i64,
    pub paused: bool,
}

impl SessionSnapshot {
    /// Seconds until the current phase ends (negative once overdue)
    pub fn remaining_secs(&self) -> i64 {
        i64::from(self.phase_minutes) * 60 - self.phase_elapsed as i64
    }
}

/// Timer state, advanced by a single owner
#[derive(Debug, Clone)]
pub struct SessionState {
    cycle: PhaseCycle,
    timer: PhaseTimer,
    phase_elapsed: u64,
    study_elapsed: u64,
    /// Study seconds from phases already completed
    previous_elapsed: u64,
    study_phase_count: u32,
}

impl SessionState {
    pub fn new(cycle: PhaseCycle, now: i64) -> Self {
        Self {
            cycle,
            timer: PhaseTimer::start(now),
            phase_elapsed: 0,
            study_elapsed: 0,
            previous_elapsed: 0,
            study_phase_count: 0,
        }
    }

    /// Continue a saved session; the current phase resumes at its saved
    /// elapsed time.
    pub fn restore(cycle: PhaseCycle, record: &SaveRecord, now: i64) -> Self {
        let mut state = Self::new(cycle, now);
        state.cycle.restore(record.phase, record.completed);
        state.timer = PhaseTimer::resume_at(now, record.phase_elapsed);
        state.phase_elapsed = record.phase_elapsed;
        state.study_elapsed = record.study_elapsed;
        state.previous_elapsed = if record.phase.is_study() {
            record.study_elapsed.saturating_sub(record.phase_elapsed)
        } else {
            record.study_elapsed
        };
        state.study_phase_count = record.study_phase_count;
        state
    }

    #[allow(dead_code)]
    pub fn cycle(&self) -> &PhaseCycle {
        &self.cycle
    }

    /// Follow the shared pause flag
    pub fn set_paused(&mut self, paused: bool, now: i64) {
        match (paused, self.timer.is_paused()) {
            (true, false) => self.timer.pause(now),
            (false, true) => self.timer.resume(now),
            _ => {}
        }
    }

    fn update_elapsed(&mut self, now: i64) {
        self.phase_elapsed = self.timer.elapsed(now);
        let current = if self.cycle.current().kind.is_study() {
            self.phase_elapsed
        } else {
            0
        };
        self.study_elapsed = self.previous_elapsed + current;
    }

    /// Refresh elapsed counters and complete the phase once it is due
    pub fn tick(&mut self, now: i64) -> Option<Transition> {
        self.update_elapsed(now);
        if self.phase_elapsed >= self.cycle.current().duration_secs() {
            Some(self.advance(now))
        } else {
            None
        }
    }

    /// Complete the current phase now, due or not
    pub fn advance(&mut self, now: i64) -> Transition {
        self.update_elapsed(now);
        if self.cycle.current().kind.is_study() {
            self.study_phase_count += 1;
            self.previous_elapsed += self.phase_elapsed;
        }

        let transition = self.cycle.complete();
        self.timer.restart(now);
        self.update_elapsed(now);
        transition
    }

    pub fn snapshot(&self, now: i64) -> SessionSnapshot {
        let phase = self.cycle.current();
        SessionSnapshot {
            phase: phase.kind,
            phase_minutes: phase.minutes,
            repetitions: phase.repetitions,
            completed: phase.completed,
            phase_elapsed: self.phase_elapsed,
            study_elapsed: self.study_elapsed,
            study_phase_count: self.study_phase_count,
            started_at: self.timer.started_at(now),
            paused: self.timer.is_paused(),
        }
    }
}

/// The concurrent loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    Render,
    Advance,
    Persist,
    Input,
}

impl LoopKind {
    pub const ALL: [LoopKind; 4] = [LoopKind::Render, LoopKind::Advance, LoopKind::Persist, LoopKind::Input];

    fn index(self) -> usize {
        match self {
            LoopKind::Render => 0,
            LoopKind::Advance => 1,
            LoopKind::Persist => 2,
            LoopKind::Input => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LoopKind::Render => "render",
            LoopKind::Advance => "advance",
            LoopKind::Persist => "persist",
            LoopKind::Input => "input",
        }
    }
}

/// State visible to every loop
///
/// Flags are written as documented on each method; the snapshot is only
/// ever written by the advance loop.
pub struct SharedSession {
    running: AtomicBool,
    force_redraw: AtomicBool,
    paused: AtomicBool,
    modal_open: AtomicBool,
    skip_requested: AtomicBool,
    finished: [AtomicBool; 4],
    snapshot: RwLock<SessionSnapshot>,
}

impl SharedSession {
    pub fn new(initial: SessionSnapshot) -> Self {
        Self {
            running: AtomicBool::new(true),
            force_redraw: AtomicBool::new(true),
            paused: AtomicBool::new(initial.paused),
            modal_open: AtomicBool::new(false),
            skip_requested: AtomicBool::new(false),
            finished: Default::default(),
            snapshot: RwLock::new(initial),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask every loop to exit
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn request_redraw(&self) {
        self.force_redraw.store(true, Ordering::SeqCst);
    }

    /// Consume a pending redraw request
    pub fn take_redraw(&self) -> bool {
        self.force_redraw.swap(false, Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Written by the input loop; the advance loop follows it
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// Flip the pause flag, returning the new value
    pub fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open.load(Ordering::SeqCst)
    }

    pub fn set_modal_open(&self, open: bool) {
        self.modal_open.store(open, Ordering::SeqCst);
    }

    pub fn request_skip(&self) {
        self.skip_requested.store(true, Ordering::SeqCst);
    }

    pub fn take_skip(&self) -> bool {
        self.skip_requested.swap(false, Ordering::SeqCst)
    }

    pub fn mark_finished(&self, kind: LoopKind) {
        self.finished[kind.index()].store(true, Ordering::SeqCst);
    }

    pub fn all_finished(&self) -> bool {
        self.finished.iter().all(|flag| flag.load(Ordering::SeqCst))
    }

    /// Replace the published snapshot (advance loop only)
    pub fn publish(&self, snapshot: SessionSnapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
