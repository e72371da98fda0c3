//! Terminal driver
//!
//! `Screen` emits raw ANSI/VT100 sequences to an output sink and polls keys
//! from a byte source. `Terminal` wraps the one `Screen` of the process in
//! the mutex every writer has to go through.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use super::input::{ByteSource, Key, KeyDecoder, StdinSource};
use crate::core::color::{Hsl, Rgb, Style};

/// Terminal dimensions in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSize {
    pub cols: u16,
    pub rows: u16,
}

/// Low-level terminal driver
pub struct Screen {
    out: Box<dyn Write + Send>,
    input: Box<dyn ByteSource>,
    decoder: KeyDecoder,
    /// Fixed size reported instead of querying the tty
    fixed_size: Option<TermSize>,
}

impl Screen {
    pub fn new(out: Box<dyn Write + Send>, input: Box<dyn ByteSource>) -> Self {
        Self {
            out,
            input,
            decoder: KeyDecoder::new(),
            fixed_size: None,
        }
    }

    /// Driver bound to the process's stdout and stdin
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(StdinSource))
    }

    /// Report `size` from `query_size` instead of asking the tty
    #[cfg(test)]
    pub fn with_fixed_size(mut self, size: TermSize) -> Self {
        self.fixed_size = Some(size);
        self
    }

    /// Current terminal size, `None` when it cannot be determined
    pub fn query_size(&self) -> Option<TermSize> {
        if let Some(size) = self.fixed_size {
            return Some(size);
        }
        match terminal::size() {
            Ok((cols, rows)) if cols > 0 && rows > 0 => Some(TermSize { cols, rows }),
            _ => None,
        }
    }

    /// Move the cursor to a zero-indexed cell
    pub fn move_cursor(&mut self, x: u16, y: u16) -> io::Result<()> {
        queue!(self.out, MoveTo(x, y))
    }

    #[allow(dead_code)]
    pub fn move_cursor_to_bottom(&mut self) -> io::Result<()> {
        match self.query_size() {
            Some(size) => self.move_cursor(0, size.rows.saturating_sub(1)),
            None => Ok(()),
        }
    }

    fn sgr(&mut self, style: Style) -> io::Result<()> {
        write!(self.out, "\x1b[{}m", style.0)
    }

    /// Set a foreground color code; non-foreground codes are ignored
    pub fn set_fg(&mut self, style: Style) -> io::Result<()> {
        if style.is_foreground() {
            self.sgr(style)?;
        }
        Ok(())
    }

    /// Set a background color code; non-background codes are ignored
    pub fn set_bg(&mut self, style: Style) -> io::Result<()> {
        if style.is_background() {
            self.sgr(style)?;
        }
        Ok(())
    }

    /// Set a text attribute code; codes outside 0-9 are ignored
    pub fn set_text_style(&mut self, style: Style) -> io::Result<()> {
        if style.is_text() {
            self.sgr(style)?;
        }
        Ok(())
    }

    pub fn set_fg_rgb(&mut self, color: Rgb) -> io::Result<()> {
        queue!(self.out, SetForegroundColor(color.into()))
    }

    pub fn set_bg_rgb(&mut self, color: Rgb) -> io::Result<()> {
        queue!(self.out, SetBackgroundColor(color.into()))
    }

    #[allow(dead_code)]
    pub fn set_fg_hsl(&mut self, color: Hsl) -> io::Result<()> {
        self.set_fg_rgb(color.to_rgb())
    }

    #[allow(dead_code)]
    pub fn set_bg_hsl(&mut self, color: Hsl) -> io::Result<()> {
        self.set_bg_rgb(color.to_rgb())
    }

    pub fn reset_styles(&mut self) -> io::Result<()> {
        self.set_fg(Style::FG_DEFAULT)?;
        self.set_bg(Style::BG_DEFAULT)?;
        self.set_text_style(Style::TEXT_DEFAULT)
    }

    pub fn write_at(&mut self, x: u16, y: u16, text: &str) -> io::Result<()> {
        self.move_cursor(x, y)?;
        self.out.write_all(text.as_bytes())
    }

    /// Overwrite `length` cells with spaces
    pub fn erase_at(&mut self, x: u16, y: u16, length: usize) -> io::Result<()> {
        self.move_cursor(x, y)?;
        write!(self.out, "{:length$}", "", length = length)
    }

    /// Erase the whole display and home the cursor
    pub fn clear_screen(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        queue!(self.out, Hide)
    }

    pub fn show_cursor(&mut self) -> io::Result<()> {
        queue!(self.out, Show)
    }

    pub fn beep(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x07")?;
        self.out.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Read at most one byte and decode it without escape handling
    pub fn poll_key(&mut self) -> io::Result<Option<Key>> {
        Ok(self.input.read_byte()?.and_then(Key::from_byte))
    }

    /// Read bytes until a key (arrows included) is decoded or input runs dry
    ///
    /// A partially read escape sequence is kept and finished on the next call.
    pub fn poll_special_key(&mut self) -> io::Result<Option<Key>> {
        while let Some(byte) = self.input.read_byte()? {
            if let Some(key) = self.decoder.feed(byte) {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}

/// The shared terminal
///
/// Every sequence of writes that must appear atomically goes through
/// `lock` or `frame`. The guard releases the lock on drop, including on
/// early returns and panics; a poisoned lock is recovered rather than
/// left held forever.
pub struct Terminal {
    screen: Mutex<Screen>,
}

impl Terminal {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen: Mutex::new(screen),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the lock as one synchronized frame
    ///
    /// The frame is closed and flushed even when `f` fails.
    pub fn frame<F, R>(&self, f: F) -> io::Result<R>
    where
        F: FnOnce(&mut Screen) -> io::Result<R>,
    {
        let mut screen = self.lock();
        screen.out.write_all(b"\x1b[?2026h")?; // begin synchronized update
        let result = f(&mut screen);
        let _ = screen.out.write_all(b"\x1b[?2026l");
        let _ = screen.flush();
        result
    }
}

/// Cloneable in-memory sink, for capturing terminal output
#[cfg(test)]
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: std::sync::Arc<Mutex<Vec<u8>>>,
}

#[cfg(test)]
impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    pub fn clear(&self) {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::ScriptedInput;

    fn capture(input: &[u8]) -> (Screen, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let screen = Screen::new(Box::new(buffer.clone()), Box::new(ScriptedInput::new(input)))
            .with_fixed_size(TermSize { cols: 80, rows: 24 });
        (screen, buffer)
    }

    #[test]
    fn test_move_cursor_is_one_indexed() {
        let (mut screen, buffer) = capture(b"");
        screen.move_cursor(0, 0).unwrap();
        screen.move_cursor(4, 9).unwrap();
        assert_eq!(buffer.contents_lossy(), "\x1b[1;1H\x1b[10;5H");
    }

    #[test]
    fn test_invalid_style_codes_are_ignored() {
        let (mut screen, buffer) = capture(b"");
        screen.set_fg(Style::BG_RED).unwrap();
        screen.set_bg(Style::FG_RED).unwrap();
        screen.set_text_style(Style(31)).unwrap();
        assert!(buffer.contents().is_empty());

        screen.set_fg(Style::FG_RED).unwrap();
        screen.set_bg(Style::BG_BRIGHT_BLUE).unwrap();
        screen.set_text_style(Style::TEXT_REVERSE).unwrap();
        assert_eq!(buffer.contents_lossy(), "\x1b[31m\x1b[104m\x1b[7m");
    }

    #[test]
    fn test_rgb_escapes() {
        let (mut screen, buffer) = capture(b"");
        screen.set_fg_rgb(Rgb::new(300, -5, 10)).unwrap();
        screen.set_bg_hsl(Hsl::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(buffer.contents_lossy(), "\x1b[38;2;255;0;10m\x1b[48;2;0;0;0m");
    }

    #[test]
    fn test_write_and_erase() {
        let (mut screen, buffer) = capture(b"");
        screen.write_at(2, 1, "hi").unwrap();
        screen.erase_at(2, 1, 3).unwrap();
        assert_eq!(buffer.contents_lossy(), "\x1b[2;3Hhi\x1b[2;3H   ");
    }

    #[test]
    fn test_poll_key_plain() {
        let (mut screen, _) = capture(b"q");
        assert_eq!(screen.poll_key().unwrap(), Some(Key::Char('q')));
        assert_eq!(screen.poll_key().unwrap(), None);
    }

    #[test]
    fn test_poll_special_key() {
        let (mut screen, _) = capture(b"\x1b[C\x1b[Z\t");
        assert_eq!(screen.poll_special_key().unwrap(), Some(Key::Right));
        // unknown sequence is swallowed, the tab behind it is decoded
        assert_eq!(screen.poll_special_key().unwrap(), Some(Key::Tab));
        assert_eq!(screen.poll_special_key().unwrap(), None);
    }

    #[test]
    fn test_query_size_fixed() {
        let (screen, _) = capture(b"");
        assert_eq!(screen.query_size(), Some(TermSize { cols: 80, rows: 24 }));
    }

    #[test]
    fn test_frame_wraps_output() {
        let buffer = SharedBuffer::new();
        let terminal = Terminal::new(Screen::new(
            Box::new(buffer.clone()),
            Box::new(ScriptedInput::default()),
        ));
        let result: io::Result<()> = terminal.frame(|screen| {
            screen.write_at(0, 0, "x")?;
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        });
        assert!(result.is_err());
        assert_eq!(buffer.contents_lossy(), "\x1b[?2026h\x1b[1;1Hx\x1b[?2026l");
        // lock is free again
        terminal.lock().beep().unwrap();
    }
}
