//! The study / break cycle.
//!
//! Three phases form a fixed cycle:
//!
//! ```text
//! Study ──(n-th completion)──> LongBreak ──> Study
//!   │                                          ▲
//!   └──────────> ShortBreak ───────────────────┘
//! ```
//!
//! Only the study phase repeats; after `repetitions` ordinary completions
//! its counter resets and the long break follows instead of the short one.

use crate::config::Settings;
use crate::core::color::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Study,
    ShortBreak,
    LongBreak,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 3] = [PhaseKind::Study, PhaseKind::ShortBreak, PhaseKind::LongBreak];

    /// Stable numeric id, as written to the save file
    pub fn id(self) -> u8 {
        match self {
            PhaseKind::Study => 0,
            PhaseKind::ShortBreak => 1,
            PhaseKind::LongBreak => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<PhaseKind> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            PhaseKind::Study => "study",
            PhaseKind::ShortBreak => "short break",
            PhaseKind::LongBreak => "long break",
        }
    }

    pub fn is_study(self) -> bool {
        self == PhaseKind::Study
    }

    /// Foreground color of the phase panel
    pub fn color(self) -> Style {
        match self {
            PhaseKind::Study => Style::FG_RED,
            PhaseKind::ShortBreak | PhaseKind::LongBreak => Style::FG_GREEN,
        }
    }

    /// Phase entered after completing this one.
    ///
    /// `limit_reached` only matters for the study phase.
    pub fn next(self, limit_reached: bool) -> PhaseKind {
        match self {
            PhaseKind::Study if limit_reached => PhaseKind::LongBreak,
            PhaseKind::Study => PhaseKind::ShortBreak,
            PhaseKind::ShortBreak | PhaseKind::LongBreak => PhaseKind::Study,
        }
    }
}

/// Per-phase settings and progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub kind: PhaseKind,
    pub minutes: u32,
    /// Completions before the long break; 0 = no repeat limit
    pub repetitions: u32,
    pub completed: u32,
}

impl Phase {
    fn new(kind: PhaseKind, minutes: u32, repetitions: u32) -> Self {
        Self {
            kind,
            minutes,
            repetitions,
            completed: 0,
        }
    }

    pub fn duration_secs(&self) -> u64 {
        u64::from(self.minutes) * 60
    }
}

/// A phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PhaseKind,
    pub to: PhaseKind,
}

/// The three phases and a cursor on the current one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCycle {
    phases: [Phase; 3],
    current: PhaseKind,
}

impl PhaseCycle {
    pub fn new(settings: &Settings) -> Self {
        Self {
            phases: [
                Phase::new(
                    PhaseKind::Study,
                    settings.study_minutes,
                    settings.sessions_before_long_break,
                ),
                Phase::new(PhaseKind::ShortBreak, settings.short_break_minutes, 0),
                Phase::new(PhaseKind::LongBreak, settings.long_break_minutes, 0),
            ],
            current: PhaseKind::Study,
        }
    }

    pub fn current(&self) -> &Phase {
        self.phase(self.current)
    }

    pub fn phase(&self, kind: PhaseKind) -> &Phase {
        &self.phases[usize::from(kind.id())]
    }

    fn phase_mut(&mut self, kind: PhaseKind) -> &mut Phase {
        &mut self.phases[usize::from(kind.id())]
    }

    /// Jump to `kind` with the given completion count (session resume)
    pub fn restore(&mut self, kind: PhaseKind, completed: u32) {
        self.current = kind;
        self.phase_mut(kind).completed = completed;
    }

    /// Complete the current phase and move to the next one
    pub fn complete(&mut self) -> Transition {
        let from = self.current;
        let phase = self.phase_mut(from);
        phase.completed += 1;

        let limit_reached = phase.repetitions > 0 && phase.completed >= phase.repetitions;
        if limit_reached {
            phase.completed = 0;
        }

        let to = from.next(limit_reached);
        self.current = to;
        Transition { from, to }
    }
}
