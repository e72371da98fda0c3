//! Bordered text windows.
//!
//! A `Window` is an axis-aligned rectangle with a single-line box border
//! and up to [`MAX_LINES`] lines of text. Raw lines are kept as given;
//! every render derives the displayed lines from them so wrapping is never
//! applied twice. Lines that fit are shown verbatim, lines that need
//! wrapping are trimmed first.
//!
//! ```text
//! ┌──────────────┐
//! │ <padding>text│
//! └──────────────┘
//! ```

use std::io;

use bitflags::bitflags;
use thiserror::Error;

use crate::core::color::Style;
use crate::core::term::Screen;
use crate::core::text::{self, Alignment};

/// Maximum number of raw (and displayed) lines in a window.
pub const MAX_LINES: usize = 10;

/// Border plus interior: one cell on each side.
const BORDER: u16 = 2;

const TOP_LEFT: char = '┌';
const TOP_RIGHT: char = '┐';
const BOTTOM_LEFT: char = '└';
const BOTTOM_RIGHT: char = '┘';
const HORIZONTAL: char = '─';
const VERTICAL: char = '│';

bitflags! {
    /// Dimensions recomputed from content on every render.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct AutoSize: u8 {
        const WIDTH  = 0b01;
        const HEIGHT = 0b10;
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WindowError {
    #[error("Window already holds {capacity} lines")]
    CapacityExceeded { capacity: usize },

    #[error("No line {index} (window has {lines} lines)")]
    NoSuchLine { index: usize, lines: usize },
}

/// Screen area covered by a window, border included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Footprint {
    x: u16,
    y: u16,
    width: u16,
    height: u16,
}

impl Footprint {
    /// Blank the rectangle plus a one-cell margin on every side.
    fn erase(&self, screen: &mut Screen) -> io::Result<()> {
        let left = self.x.saturating_sub(1);
        let right = self.x.saturating_add(self.width);
        let length = usize::from(right - left) + 1;

        screen.set_bg(Style::BG_DEFAULT)?;
        let top = self.y.saturating_sub(1);
        let bottom = self.y.saturating_add(self.height);
        for row in top..=bottom {
            screen.erase_at(left, row, length)?;
        }
        Ok(())
    }
}

/// A positioned, bordered text container
#[derive(Debug, Clone)]
pub struct Window {
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    auto_size: AutoSize,
    padding: u16,
    alignment: Alignment,
    line_wrap: bool,
    visible: bool,
    fg: Style,
    bg: Style,
    text_style: Style,
    lines: Vec<String>,
    rendered: Vec<String>,
    /// Footprint left behind by an explicit resize, erased on next render
    stale: Option<Footprint>,
}

impl Window {
    /// New visible, auto-sized window with its top-left corner at (x, y)
    pub fn new(x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            width: 1,
            height: 1,
            auto_size: AutoSize::all(),
            padding: 1,
            alignment: Alignment::Left,
            line_wrap: true,
            visible: true,
            fg: Style::FG_DEFAULT,
            bg: Style::BG_DEFAULT,
            text_style: Style::TEXT_DEFAULT,
            lines: Vec::new(),
            rendered: Vec::new(),
            stale: None,
        }
    }

    // ---- line buffer ----

    /// Append a line; fails once the window holds [`MAX_LINES`] lines.
    ///
    /// Returns the new line count.
    pub fn add_line(&mut self, line: impl Into<String>) -> Result<usize, WindowError> {
        if self.lines.len() >= MAX_LINES {
            return Err(WindowError::CapacityExceeded { capacity: MAX_LINES });
        }
        self.lines.push(line.into());
        Ok(self.lines.len())
    }

    #[allow(dead_code)]
    pub fn change_line(&mut self, index: usize, line: impl Into<String>) -> Result<(), WindowError> {
        let lines = self.lines.len();
        let slot = self
            .lines
            .get_mut(index)
            .ok_or(WindowError::NoSuchLine { index, lines })?;
        *slot = line.into();
        Ok(())
    }

    #[allow(dead_code)]
    /// Remove a line, shifting the following ones up. Returns the new count.
    pub fn delete_line(&mut self, index: usize) -> Result<usize, WindowError> {
        if index >= self.lines.len() {
            return Err(WindowError::NoSuchLine {
                index,
                lines: self.lines.len(),
            });
        }
        self.lines.remove(index);
        Ok(self.lines.len())
    }

    pub fn clear_lines(&mut self) {
        self.lines.clear();
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[allow(dead_code)]
    /// Lines as last laid out for display
    pub fn rendered_lines(&self) -> &[String] {
        &self.rendered
    }

    // ---- geometry ----

    pub fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }

    /// Move the top-left corner; `None` keeps that coordinate
    pub fn set_position(&mut self, x: Option<u16>, y: Option<u16>) {
        if let Some(x) = x {
            self.x = x;
        }
        if let Some(y) = y {
            self.y = y;
        }
    }

    #[allow(dead_code)]
    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.x = offset(self.x, dx);
        self.y = offset(self.y, dy);
    }

    /// Cell just past the bottom-right corner
    pub fn bottom_right(&self) -> (u16, u16) {
        (
            self.x.saturating_add(self.width),
            self.y.saturating_add(self.height),
        )
    }

    /// Current (width, height); (0, 0) while hidden
    pub fn size(&self) -> (u16, u16) {
        if self.visible {
            (self.width, self.height)
        } else {
            (0, 0)
        }
    }

    /// Set the width. Does not touch the auto-size flags; the old footprint
    /// is erased on the next render.
    pub fn set_width(&mut self, width: u16) {
        if width != self.width {
            self.mark_stale();
            self.width = width;
        }
    }

    /// Set the height. Same rules as [`Window::set_width`].
    pub fn set_height(&mut self, height: u16) {
        if height != self.height {
            self.mark_stale();
            self.height = height;
        }
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.set_width(width);
        self.set_height(height);
    }

    fn mark_stale(&mut self) {
        // an earlier pending footprint is the one actually on screen
        if self.stale.is_none() {
            self.stale = Some(self.footprint());
        }
    }

    fn footprint(&self) -> Footprint {
        Footprint {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    // ---- layout settings ----

    pub fn set_padding(&mut self, padding: u16) {
        self.padding = padding;
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    #[allow(dead_code)]
    pub fn set_line_wrap(&mut self, line_wrap: bool) {
        self.line_wrap = line_wrap;
    }

    /// Toggle both auto-size flags at once
    pub fn set_auto_size(&mut self, enabled: bool) {
        self.auto_size.set(AutoSize::all(), enabled);
    }

    pub fn set_auto_width(&mut self, enabled: bool) {
        self.auto_size.set(AutoSize::WIDTH, enabled);
    }

    #[allow(dead_code)]
    pub fn set_auto_height(&mut self, enabled: bool) {
        self.auto_size.set(AutoSize::HEIGHT, enabled);
    }

    #[allow(dead_code)]
    pub fn auto_size(&self) -> AutoSize {
        self.auto_size
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Flip visibility, returning the new state
    pub fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    // ---- styles ----

    pub fn set_fg(&mut self, style: Style) {
        self.fg = style;
    }

    pub fn set_bg(&mut self, style: Style) {
        self.bg = style;
    }

    pub fn set_text_style(&mut self, style: Style) {
        self.text_style = style;
    }

    #[allow(dead_code)]
    pub fn text_style(&self) -> Style {
        self.text_style
    }

    // ---- layout ----

    fn interior_width(&self) -> usize {
        usize::from(
            self.width
                .saturating_sub(BORDER)
                .saturating_sub(self.padding.saturating_mul(2)),
        )
    }

    /// Recompute the auto dimensions and the displayed lines without drawing
    pub fn auto_resize(&mut self) {
        if self.auto_size.contains(AutoSize::WIDTH) {
            let longest = text::longest_line(&self.lines);
            let width = longest + usize::from(BORDER) + 2 * usize::from(self.padding);
            self.width = u16::try_from(width).unwrap_or(u16::MAX);
        }

        let interior = self.interior_width();
        let mut rendered = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if self.line_wrap && text::text_width(line) > interior {
                rendered.extend(text::wrap(text::trim(line).0, interior));
            } else {
                rendered.push(line.clone());
            }
        }
        rendered.truncate(MAX_LINES);

        if self.auto_size.contains(AutoSize::HEIGHT) {
            // MAX_LINES keeps this well inside u16
            self.height = rendered.len() as u16 + BORDER;
        } else {
            rendered.truncate(usize::from(self.height.saturating_sub(BORDER)));
        }

        self.rendered = rendered;
    }

    // ---- drawing ----

    /// Draw the window. Hidden windows draw nothing.
    ///
    /// The caller is expected to hold the terminal lock.
    pub fn render(&mut self, screen: &mut Screen) -> io::Result<()> {
        if let Some(stale) = self.stale.take() {
            stale.erase(screen)?;
        }
        if !self.visible {
            return Ok(());
        }

        self.auto_resize();

        screen.set_fg(self.fg)?;
        screen.set_bg(self.bg)?;
        self.draw_border(screen)?;

        if self.text_style != Style::TEXT_DEFAULT {
            screen.set_text_style(self.text_style)?;
        }

        let interior = self.interior_width();
        let left = self.x.saturating_add(1).saturating_add(self.padding);
        for (row, line) in self.rendered.iter().enumerate() {
            let shown = text::clip(line, interior);
            let spacing = text::spacing(self.alignment, interior, text::text_width(shown));
            let lx = left.saturating_add(u16::try_from(spacing).unwrap_or(u16::MAX));
            let ly = self.y.saturating_add(1 + row as u16);
            screen.write_at(lx, ly, shown)?;
        }

        screen.reset_styles()
    }

    fn draw_border(&self, screen: &mut Screen) -> io::Result<()> {
        if self.width < BORDER || self.height < BORDER {
            return Ok(());
        }

        let inner: String = std::iter::repeat(HORIZONTAL)
            .take(usize::from(self.width - BORDER))
            .collect();
        let right = self.x + self.width - 1;
        let bottom = self.y + self.height - 1;

        screen.write_at(self.x, self.y, &format!("{TOP_LEFT}{inner}{TOP_RIGHT}"))?;
        for row in self.y + 1..bottom {
            screen.write_at(self.x, row, &VERTICAL.to_string())?;
            screen.write_at(right, row, &VERTICAL.to_string())?;
        }
        screen.write_at(self.x, bottom, &format!("{BOTTOM_LEFT}{inner}{BOTTOM_RIGHT}"))
    }

    /// Blank the window's rectangle and a one-cell margin around it
    pub fn clear(&mut self, screen: &mut Screen) -> io::Result<()> {
        if let Some(stale) = self.stale.take() {
            stale.erase(screen)?;
        }
        self.footprint().erase(screen)
    }
}

fn offset(value: u16, delta: i32) -> u16 {
    (i32::from(value) + delta).clamp(0, i32::from(u16::MAX)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::{ScriptedInput, SharedBuffer, TermSize};

    fn capture() -> (Screen, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let screen = Screen::new(Box::new(buffer.clone()), Box::new(ScriptedInput::default()))
            .with_fixed_size(TermSize { cols: 80, rows: 24 });
        (screen, buffer)
    }

    #[test]
    fn test_add_line_capacity() {
        let mut window = Window::new(0, 0);
        for i in 0..MAX_LINES {
            assert_eq!(window.add_line(format!("line {i}")), Ok(i + 1));
        }
        assert_eq!(
            window.add_line("one too many"),
            Err(WindowError::CapacityExceeded { capacity: MAX_LINES })
        );
        assert_eq!(window.line_count(), MAX_LINES);
    }

    #[test]
    fn test_change_and_delete_line() {
        let mut window = Window::new(0, 0);
        window.add_line("a").unwrap();
        window.add_line("b").unwrap();
        window.add_line("c").unwrap();

        window.change_line(1, "B").unwrap();
        assert_eq!(
            window.change_line(3, "x"),
            Err(WindowError::NoSuchLine { index: 3, lines: 3 })
        );

        assert_eq!(window.delete_line(0), Ok(2));
        assert_eq!(window.lines(), &["B".to_string(), "c".to_string()]);
        assert!(window.delete_line(2).is_err());

        window.clear_lines();
        assert_eq!(window.line_count(), 0);
    }

    #[test]
    fn test_auto_size() {
        let mut window = Window::new(0, 0);
        window.add_line("hello").unwrap();
        window.add_line("  hi  ").unwrap();
        window.auto_resize();
        assert_eq!(window.size(), (10, 4));
        // lines that fit keep their spaces
        assert_eq!(window.rendered_lines(), &["hello", "  hi  "]);

        window.set_padding(3);
        window.auto_resize();
        assert_eq!(window.size(), (14, 4));
    }

    #[test]
    fn test_fixed_width_wraps_and_grows_height() {
        let mut window = Window::new(0, 0);
        window.set_auto_width(false);
        window.set_width(12);
        window.add_line("aaaa bbbb cccc").unwrap();
        window.auto_resize();
        assert_eq!(window.rendered_lines(), &["aaaa", "bbbb", "cccc"]);
        assert_eq!(window.size(), (12, 5));
        // raw lines are untouched
        assert_eq!(window.lines(), &["aaaa bbbb cccc".to_string()]);

        // wrapping again from the raw lines gives the same result
        window.auto_resize();
        assert_eq!(window.rendered_lines().len(), 3);
    }

    #[test]
    fn test_fixed_height_truncates() {
        let mut window = Window::new(0, 0);
        window.set_auto_size(false);
        window.set_size(12, 4);
        window.add_line("aaaa bbbb cccc").unwrap();
        window.auto_resize();
        assert_eq!(window.rendered_lines(), &["aaaa", "bbbb"]);
        assert_eq!(window.size(), (12, 4));
    }

    #[test]
    fn test_no_wrap_copies_through() {
        let mut window = Window::new(0, 0);
        window.set_auto_width(false);
        window.set_width(6);
        window.set_line_wrap(false);
        window.add_line("too long for this").unwrap();
        window.auto_resize();
        assert_eq!(window.rendered_lines(), &["too long for this"]);
    }

    #[test]
    fn test_rendered_never_exceeds_capacity() {
        let mut window = Window::new(0, 0);
        window.set_auto_width(false);
        window.set_width(8);
        for _ in 0..MAX_LINES {
            window.add_line("abcd efgh").unwrap();
        }
        window.auto_resize();
        assert_eq!(window.rendered_lines().len(), MAX_LINES);
        assert_eq!(window.size().1, MAX_LINES as u16 + 2);
    }

    #[test]
    fn test_render_output() {
        let (mut screen, buffer) = capture();
        let mut window = Window::new(0, 0);
        window.add_line("hi").unwrap();
        window.render(&mut screen).unwrap();

        let out = buffer.contents_lossy();
        assert!(out.contains("\x1b[1;1H┌────┐"));
        assert!(out.contains("\x1b[2;1H│\x1b[2;6H│"));
        assert!(out.contains("\x1b[2;3Hhi"));
        assert!(out.contains("\x1b[3;1H└────┘"));
    }

    #[test]
    fn test_render_centered() {
        let (mut screen, buffer) = capture();
        let mut window = Window::new(0, 0);
        window.set_auto_width(false);
        window.set_width(12);
        window.set_alignment(Alignment::Center);
        window.add_line("ab").unwrap();
        window.render(&mut screen).unwrap();
        assert!(buffer.contents_lossy().contains("\x1b[2;6Hab"));
    }

    #[test]
    fn test_render_styles() {
        let (mut screen, buffer) = capture();
        let mut window = Window::new(0, 0);
        window.set_fg(Style::FG_RED);
        window.set_text_style(Style::TEXT_ITALIC);
        window.add_line("x").unwrap();
        window.render(&mut screen).unwrap();

        let out = buffer.contents_lossy();
        assert!(out.starts_with("\x1b[31m\x1b[49m"));
        assert!(out.contains("\x1b[3m"));
        assert!(out.ends_with("\x1b[39m\x1b[49m\x1b[0m"));
    }

    #[test]
    fn test_hidden_window_draws_nothing() {
        let (mut screen, buffer) = capture();
        let mut window = Window::new(0, 0);
        window.add_line("secret").unwrap();
        assert!(!window.toggle_visible());
        window.render(&mut screen).unwrap();
        assert!(buffer.contents().is_empty());
        assert_eq!(window.size(), (0, 0));
    }

    #[test]
    fn test_resize_erases_old_footprint() {
        let (mut screen, buffer) = capture();
        let mut window = Window::new(4, 4);
        window.set_auto_size(false);
        window.set_size(10, 4);
        window.render(&mut screen).unwrap();
        buffer.clear();

        window.set_width(6);
        window.render(&mut screen).unwrap();
        let out = buffer.contents_lossy();
        // initial 1x1 footprint was replaced, so the erase covers 10x4 plus margin
        assert!(out.starts_with("\x1b[49m\x1b[4;4H            "));
        assert!(out.contains("\x1b[9;4H            "));
    }

    #[test]
    fn test_clear_margin_at_origin() {
        let (mut screen, buffer) = capture();
        let mut window = Window::new(0, 0);
        window.set_auto_size(false);
        window.set_size(4, 3);
        buffer.clear();
        window.clear(&mut screen).unwrap();
        let out = buffer.contents_lossy();
        // the 1x1 initial footprint is erased first, then rows 0..=3
        assert!(out.contains("\x1b[1;1H     \x1b[2;1H     \x1b[3;1H     \x1b[4;1H     "));
    }

    #[test]
    fn test_geometry() {
        let mut window = Window::new(5, 5);
        window.set_auto_size(false);
        window.set_size(10, 3);
        assert_eq!(window.bottom_right(), (15, 8));

        window.set_position(None, Some(2));
        assert_eq!(window.position(), (5, 2));
        window.move_by(-10, 3);
        assert_eq!(window.position(), (0, 5));
    }
}
