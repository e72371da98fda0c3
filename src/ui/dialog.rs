//! Two-button modal dialog.
//!
//! A dialog is one fixed-size content window plus two button windows
//! placed near its bottom border. Button 0 is the left ("NO") button and
//! button 1 the right ("YES") one; the active button is drawn in reverse
//! video.

use std::io;
use std::thread;
use std::time::Duration;

use crate::core::color::Style;
use crate::core::term::{Key, Screen, Terminal};
use crate::core::text::{self, Alignment};
use crate::ui::window::{Window, WindowError};

pub const DIALOG_WIDTH: u16 = 40;
pub const DIALOG_HEIGHT: u16 = 10;

/// Distance between a button and the nearest dialog border.
const BUTTON_MARGIN: u16 = 4;
/// Spaces added on each side of a button label.
const LABEL_PADDING: usize = 2;

/// Index of the left button.
pub const BUTTON_NO: usize = 0;
/// Index of the right button.
pub const BUTTON_YES: usize = 1;

/// Delay between key polls while waiting for an answer.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of feeding one key to the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogEvent {
    /// Key has no meaning for the dialog
    Ignored,
    /// Focus was (re)assigned; the dialog needs a redraw
    Changed,
    /// A button was confirmed
    Chosen(usize),
}

pub struct Dialog {
    window: Window,
    buttons: [Window; 2],
    active: usize,
    center_x: bool,
    center_y: bool,
}

impl Dialog {
    /// Dialog with its top-left corner at (x, y) and "NO" / "YES" buttons
    pub fn new(x: u16, y: u16) -> Self {
        let mut window = Window::new(x, y);
        window.set_auto_size(false);
        window.set_size(DIALOG_WIDTH, DIALOG_HEIGHT);
        window.set_alignment(Alignment::Center);

        let button_y = y + DIALOG_HEIGHT - BUTTON_MARGIN;
        let mut left = Window::new(x + BUTTON_MARGIN, button_y);
        let mut right = Window::new(x + DIALOG_WIDTH - 11 - BUTTON_MARGIN, button_y);

        for (button, label) in [(&mut left, "NO"), (&mut right, "YES")] {
            button.set_alignment(Alignment::Center);
            // the label fits, so this cannot fail on an empty window
            let _ = button.add_line(text::pad(label, LABEL_PADDING));
        }

        Self {
            window,
            buttons: [left, right],
            active: BUTTON_NO,
            center_x: false,
            center_y: false,
        }
    }

    /// Replace the message, preceded by `v_padding` blank lines
    pub fn set_text(&mut self, message: &str, v_padding: usize) -> Result<(), WindowError> {
        self.window.clear_lines();
        for _ in 0..v_padding {
            self.window.add_line("")?;
        }
        self.window.add_line(message)?;
        Ok(())
    }

    /// Horizontal padding of the content window
    pub fn set_padding(&mut self, padding: u16) {
        self.window.set_padding(padding);
    }

    #[allow(dead_code)]
    /// Relabel the buttons; the right button is re-anchored to the right edge
    pub fn set_buttons(&mut self, yes: &str, no: &str) {
        for (button, label) in self.buttons.iter_mut().zip([no, yes]) {
            button.clear_lines();
            let _ = button.add_line(text::pad(label, LABEL_PADDING));
        }

        let right = &mut self.buttons[BUTTON_YES];
        right.auto_resize();
        let (edge, _) = self.window.bottom_right();
        let x = edge
            .saturating_sub(BUTTON_MARGIN)
            .saturating_sub(right.size().0);
        right.set_position(Some(x), None);
    }

    /// Center on either axis against the terminal size at render time
    pub fn center(&mut self, on_x: bool, on_y: bool) {
        self.center_x = on_x;
        self.center_y = on_y;
    }

    #[allow(dead_code)]
    pub fn active(&self) -> usize {
        self.active
    }

    /// Apply a key to the focus state machine
    pub fn handle_key(&mut self, key: Key) -> DialogEvent {
        match key {
            Key::Left => {
                self.active = BUTTON_NO;
                DialogEvent::Changed
            }
            Key::Right => {
                self.active = BUTTON_YES;
                DialogEvent::Changed
            }
            Key::Tab => {
                self.active = 1 - self.active;
                DialogEvent::Changed
            }
            Key::Enter => DialogEvent::Chosen(self.active),
            _ => DialogEvent::Ignored,
        }
    }

    fn apply_centering(&mut self, screen: &Screen) {
        if !(self.center_x || self.center_y) {
            return;
        }
        let Some(size) = screen.query_size() else {
            return;
        };

        // the target is never negative, so every window moves by the same
        // amount without hitting the screen edge
        let (x, y) = self.window.position();
        let (width, height) = self.window.size();
        let dx = if self.center_x {
            ((i32::from(size.cols) - i32::from(width)) / 2).max(0) - i32::from(x)
        } else {
            0
        };
        let dy = if self.center_y {
            ((i32::from(size.rows) - i32::from(height)) / 2).max(0) - i32::from(y)
        } else {
            0
        };

        self.window.move_by(dx, dy);
        for button in &mut self.buttons {
            button.move_by(dx, dy);
        }
    }

    /// Draw the content window and both buttons
    pub fn render(&mut self, screen: &mut Screen) -> io::Result<()> {
        self.apply_centering(screen);
        self.window.render(screen)?;

        for (index, button) in self.buttons.iter_mut().enumerate() {
            let style = if index == self.active {
                Style::TEXT_REVERSE
            } else {
                Style::TEXT_DEFAULT
            };
            button.set_text_style(style);
            button.render(screen)?;
        }
        Ok(())
    }

    /// Erase the content window and both buttons
    pub fn clear(&mut self, screen: &mut Screen) -> io::Result<()> {
        self.window.clear(screen)?;
        for button in &mut self.buttons {
            button.clear(screen)?;
        }
        Ok(())
    }

    /// Block until a button is confirmed, returning its index.
    ///
    /// The terminal lock is taken once per poll and released while idle.
    pub fn wait_response(&mut self, terminal: &Terminal) -> io::Result<usize> {
        loop {
            let key = terminal.lock().poll_special_key()?;
            let Some(key) = key else {
                thread::sleep(POLL_INTERVAL);
                continue;
            };

            match self.handle_key(key) {
                DialogEvent::Chosen(index) => return Ok(index),
                DialogEvent::Changed => terminal.frame(|screen| self.render(screen))?,
                DialogEvent::Ignored => {}
            }
        }
    }
}

/// Show a centered yes/no question and wait for the answer.
///
/// Returns `true` when "YES" was chosen. The dialog is erased before
/// returning.
pub fn confirm(terminal: &Terminal, question: &str, top: u16) -> io::Result<bool> {
    let mut dialog = Dialog::new(0, top);
    dialog.set_padding(4);
    dialog
        .set_text(question, 1)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    dialog.center(true, false);

    terminal.frame(|screen| dialog.render(screen))?;
    let answer = dialog.wait_response(terminal)?;
    terminal.frame(|screen| dialog.clear(screen))?;

    tracing::debug!("Dialog {:?} answered {}", question, answer);
    Ok(answer == BUTTON_YES)
}
