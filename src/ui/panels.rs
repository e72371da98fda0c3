//! The five windows of the main screen.
//!
//! ```text
//!          ┌ phase ─────────┐ ┌ total ───────────┐
//!          └────────────────┘ └──────────────────┘
//!          ┌ quote ─────────────────────────────┐
//!          └────────────────────────────────────┘
//!          ┌ controls (toggled with I) ─────────┐
//!          └────────────────────────────────────┘
//!          ┌ paused banner (only while paused) ─┐
//!          └────────────────────────────────────┘
//! ```

use std::io;

use chrono::{DateTime, Duration, Local};

use crate::core::color::Style;
use crate::core::term::{Screen, TermSize};
use crate::core::text::Alignment;
use crate::quotes::Quote;
use crate::session::SessionSnapshot;
use crate::ui::window::Window;

/// Top row of the layout
pub const Y_BORDER: u16 = 1;
/// Horizontal text padding inside every panel
const PADDING: u16 = 2;
/// Initial quote window height; grows with wrapped text
const QUOTE_HEIGHT: u16 = 4;
const PAUSED_HEIGHT: u16 = 3;

const CONTROLS_TEXT: &str =
    "press S to skip, P to pause, Q to get a new quote, I to hide this window, CTRL+C to exit";
const PAUSED_TEXT: &str = "WARNING, TIMER IS CURRENTLY PAUSED";

/// `MM:SS`, or `HH:MM:SS` from one hour on
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Wall-clock time `delta_secs` from `now`, as `HH:MM:SS`
pub fn format_clock(now: DateTime<Local>, delta_secs: i64) -> String {
    (now + Duration::seconds(delta_secs))
        .format("%H:%M:%S")
        .to_string()
}

fn panel(fg: Style) -> Window {
    let mut window = Window::new(0, Y_BORDER);
    window.set_alignment(Alignment::Center);
    window.set_padding(PADDING);
    window.set_fg(fg);
    window
}

pub struct Panels {
    phase: Window,
    total: Window,
    quote: Window,
    controls: Window,
    paused: Window,
    /// Left edge of the layout
    dx: u16,
}

impl Panels {
    pub fn new(quote: &Quote) -> Self {
        let phase = panel(Style::FG_RED);
        let total = panel(Style::FG_BRIGHT_YELLOW);

        let mut quote_window = panel(Style::FG_BRIGHT_BLUE);
        quote_window.set_auto_width(false);
        quote_window.set_text_style(Style::TEXT_ITALIC);

        let mut controls = panel(Style::FG_BRIGHT_GREEN);
        controls.set_auto_width(false);
        let _ = controls.add_line(CONTROLS_TEXT);

        let mut paused = panel(Style::FG_BRIGHT_RED);
        paused.set_auto_size(false);
        paused.set_text_style(Style::TEXT_BLINKING);
        paused.set_visible(false);
        let _ = paused.add_line(PAUSED_TEXT);

        let mut panels = Self {
            phase,
            total,
            quote: quote_window,
            controls,
            paused,
            dx: 0,
        };
        panels.set_quote(quote);
        panels
    }

    pub fn set_quote(&mut self, quote: &Quote) {
        self.quote.clear_lines();
        let _ = self.quote.add_line(quote.text.as_str());
        if !quote.author.is_empty() {
            let _ = self.quote.add_line(quote.author.as_str());
        }
    }

    /// Show or hide the controls window, returning the new visibility
    pub fn toggle_controls(&mut self) -> bool {
        self.controls.toggle_visible()
    }

    /// Rewrite the phase and total windows from `snapshot`.
    ///
    /// Returns `true` when either window's width changed, which needs a new
    /// layout.
    pub fn update_status(&mut self, snapshot: &SessionSnapshot, now: DateTime<Local>) -> bool {
        let before = (self.phase.size().0, self.total.size().0);

        let name = snapshot.phase.name();
        let header = if snapshot.repetitions > 0 {
            format!(
                "current phase: {} [{}/{}]",
                name,
                snapshot.completed + 1,
                snapshot.repetitions
            )
        } else {
            format!("current phase: {}", name)
        };

        self.phase.clear_lines();
        self.phase.set_fg(snapshot.phase.color());
        for line in [
            header,
            format!("phase duration: {} minutes", snapshot.phase_minutes),
            format!("elapsed time: {}", format_elapsed(snapshot.phase_elapsed)),
        ] {
            let _ = self.phase.add_line(line);
        }

        self.total.clear_lines();
        for line in [
            format!("total study sessions: {}", snapshot.study_phase_count),
            format!("total time studied: {}", format_elapsed(snapshot.study_elapsed)),
            format!("phase ending: {}", format_clock(now, snapshot.remaining_secs())),
        ] {
            let _ = self.total.add_line(line);
        }

        self.phase.auto_resize();
        self.total.auto_resize();
        before != (self.phase.size().0, self.total.size().0)
    }

    /// Position every window for a terminal of `size`.
    ///
    /// With an unknown size the previous horizontal offset is kept.
    pub fn layout(&mut self, size: Option<TermSize>, paused: bool) {
        self.phase.auto_resize();
        self.total.auto_resize();

        if let Some(size) = size {
            let largest = i32::from(self.phase.size().0) + i32::from(self.total.size().0) + 1;
            self.dx = ((i32::from(size.cols) - largest) / 2).max(0) as u16;
        }
        let dx = self.dx;

        self.phase.set_position(Some(dx), Some(Y_BORDER));
        let (phase_right, _) = self.phase.bottom_right();
        self.total.set_position(Some(phase_right + 1), Some(Y_BORDER));
        self.total.auto_resize();

        let (total_right, total_bottom) = self.total.bottom_right();
        let span = total_right.saturating_sub(dx);

        self.quote.set_position(Some(dx), Some(total_bottom));
        self.quote.set_size(span, QUOTE_HEIGHT);
        self.quote.auto_resize();
        let (quote_right, quote_bottom) = self.quote.bottom_right();

        self.controls.set_position(Some(dx), Some(quote_bottom));
        self.controls.set_width(span);
        self.controls.auto_resize();

        let paused_top = if self.controls.is_visible() {
            self.controls.bottom_right().1
        } else {
            quote_bottom
        };
        self.paused.set_position(Some(dx), Some(paused_top));
        self.paused.set_size(quote_right.saturating_sub(dx), PAUSED_HEIGHT);
        self.paused.set_visible(paused);
    }

    /// Redraw just the two status windows
    pub fn render_status(&mut self, screen: &mut Screen) -> io::Result<()> {
        self.phase.render(screen)?;
        self.total.render(screen)
    }

    /// Draw every window
    pub fn render_all(&mut self, screen: &mut Screen) -> io::Result<()> {
        self.phase.render(screen)?;
        self.total.render(screen)?;
        self.quote.render(screen)?;
        self.controls.render(screen)?;
        self.paused.render(screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::{ScriptedInput, SharedBuffer};
    use crate::session::PhaseKind;
    use chrono::TimeZone;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            phase: PhaseKind::Study,
            phase_minutes: 45,
            repetitions: 4,
            completed: 1,
            phase_elapsed: 754,
            study_elapsed: 4_354,
            study_phase_count: 1,
            started_at: 0,
            paused: false,
        }
    }

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(754), "12:34");
        assert_eq!(format_elapsed(3_600), "01:00:00");
        assert_eq!(format_elapsed(4_354), "01:12:34");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(noon(), 0), "12:00:00");
        assert_eq!(format_clock(noon(), 1_946), "12:32:26");
    }

    #[test]
    fn test_status_lines() {
        let mut panels = Panels::new(&Quote::fallback());
        panels.update_status(&snapshot(), noon());

        assert_eq!(
            panels.phase.lines(),
            &[
                "current phase: study [2/4]",
                "phase duration: 45 minutes",
                "elapsed time: 12:34",
            ]
        );
        assert_eq!(
            panels.total.lines(),
            &[
                "total study sessions: 1",
                "total time studied: 01:12:34",
                "phase ending: 12:32:26",
            ]
        );

        let brk = SessionSnapshot {
            phase: PhaseKind::ShortBreak,
            repetitions: 0,
            ..snapshot()
        };
        panels.update_status(&brk, noon());
        assert_eq!(panels.phase.lines()[0], "current phase: short break");
    }

    #[test]
    fn test_width_change_is_reported() {
        let mut panels = Panels::new(&Quote::fallback());
        assert!(panels.update_status(&snapshot(), noon()));
        assert!(!panels.update_status(&snapshot(), noon()));

        let longer = SessionSnapshot {
            study_phase_count: 12_345_678,
            ..snapshot()
        };
        assert!(panels.update_status(&longer, noon()));
    }

    #[test]
    fn test_layout() {
        let mut panels = Panels::new(&Quote::fallback());
        panels.update_status(&snapshot(), noon());
        panels.layout(Some(TermSize { cols: 100, rows: 40 }), false);

        let (phase_w, phase_h) = panels.phase.size();
        let (total_w, _) = panels.total.size();
        let dx = (100 - (phase_w + total_w + 1)) / 2;
        assert_eq!(panels.phase.position(), (dx, Y_BORDER));
        assert_eq!(panels.total.position(), (dx + phase_w + 1, Y_BORDER));

        let span = phase_w + 1 + total_w;
        assert_eq!(panels.quote.position(), (dx, Y_BORDER + phase_h));
        assert_eq!(panels.quote.size().0, span);
        assert_eq!(panels.controls.position().1, panels.quote.bottom_right().1);
        assert_eq!(panels.controls.size().0, span);
        assert_eq!(panels.paused.size(), (0, 0));

        // hidden controls pull the paused banner up to the quote
        panels.toggle_controls();
        panels.layout(None, true);
        assert_eq!(panels.phase.position(), (dx, Y_BORDER));
        assert_eq!(panels.paused.position().1, panels.quote.bottom_right().1);
        assert_eq!(panels.paused.size(), (span, PAUSED_HEIGHT));
    }

    #[test]
    fn test_quote_without_author() {
        let mut panels = Panels::new(&Quote::fallback());
        assert_eq!(panels.quote.line_count(), 2);
        panels.set_quote(&Quote {
            text: "anonymous".to_string(),
            author: String::new(),
        });
        assert_eq!(panels.quote.lines(), &["anonymous"]);
    }

    #[test]
    fn test_render_all_draws_visible_windows() {
        let buffer = SharedBuffer::new();
        let mut screen = Screen::new(Box::new(buffer.clone()), Box::new(ScriptedInput::default()));
        let mut panels = Panels::new(&Quote::fallback());
        panels.update_status(&snapshot(), noon());
        panels.layout(Some(TermSize { cols: 120, rows: 40 }), false);
        panels.render_all(&mut screen).unwrap();

        let out = buffer.contents_lossy();
        assert!(out.contains("current phase: study [2/4]"));
        assert!(out.contains("Well begun is half done."));
        assert!(out.contains("press S to skip"));
        assert!(!out.contains(PAUSED_TEXT));
    }
}
