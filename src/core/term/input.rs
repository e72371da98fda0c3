//! Keyboard input decoding
//!
//! Turns raw bytes read from the terminal into logical keys. Arrow keys
//! arrive as three-byte CSI sequences (`ESC [ A..D`) and are resolved by a
//! small state machine; everything else is a single byte.

#[cfg(test)]
use std::collections::VecDeque;
use std::io::{self, Read};

/// A decoded key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Printable ASCII character
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Tab,
    Enter,
    Space,
    Backspace,
    /// Ctrl+C delivered as data (signal generation disabled)
    Interrupt,
}

impl Key {
    /// Decode a single byte with no escape handling.
    ///
    /// `ESC` and unknown control bytes yield `None`.
    pub fn from_byte(byte: u8) -> Option<Key> {
        match byte {
            0x03 => Some(Key::Interrupt),
            0x09 => Some(Key::Tab),
            0x0A | 0x0D => Some(Key::Enter),
            0x20 => Some(Key::Space),
            0x7F => Some(Key::Backspace),
            0x21..=0x7E => Some(Key::Char(byte as char)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum DecoderState {
    #[default]
    Idle,
    Escaped,
    Csi,
}

/// Escape-aware key decoder
///
/// Malformed or unknown sequences are dropped and the decoder returns to
/// `Idle`; a sequence split across reads is resumed on the next byte.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    state: DecoderState,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte, returning a key when one is complete.
    pub fn feed(&mut self, byte: u8) -> Option<Key> {
        match self.state {
            DecoderState::Idle => {
                if byte == 0x1B {
                    self.state = DecoderState::Escaped;
                    None
                } else {
                    Key::from_byte(byte)
                }
            }
            DecoderState::Escaped => {
                self.state = if byte == b'[' {
                    DecoderState::Csi
                } else {
                    DecoderState::Idle
                };
                None
            }
            DecoderState::Csi => {
                self.state = DecoderState::Idle;
                match byte {
                    b'A' => Some(Key::Up),
                    b'B' => Some(Key::Down),
                    b'C' => Some(Key::Right),
                    b'D' => Some(Key::Left),
                    _ => None,
                }
            }
        }
    }

    #[allow(dead_code)]
    /// True while in the middle of an escape sequence.
    pub fn is_pending(&self) -> bool {
        self.state != DecoderState::Idle
    }
}

/// Non-blocking source of input bytes
///
/// `Ok(None)` means nothing is available right now; callers poll again
/// later.
pub trait ByteSource: Send {
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Standard input, expected to be in raw mode with `VMIN = 0`
pub struct StdinSource;

impl ByteSource for StdinSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match io::stdin().read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Pre-recorded input
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedInput {
    bytes: VecDeque<u8>,
}

#[cfg(test)]
impl ScriptedInput {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl ByteSource for ScriptedInput {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.bytes.pop_front())
    }
}
