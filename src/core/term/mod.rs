//! Terminal driver: raw mode, ANSI output and key decoding.

mod input;
mod raw;
mod screen;

pub use input::Key;
pub use raw::RawMode;
pub use screen::{Screen, TermSize, Terminal};

#[cfg(test)]
pub use input::ScriptedInput;
#[cfg(test)]
pub use screen::SharedBuffer;
