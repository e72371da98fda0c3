//! Terminal primitives.
//!
//! - **color**: RGB/HSL conversion and SGR style codes
//! - **text**: trim, pad, word-wrap and alignment helpers
//! - **term**: raw mode, the ANSI driver and key decoding
//! - **signals**: interrupt/resize flags set from signal handlers
//!
//! # Architecture
//!
//! ```text
//! Terminal (one lock)
//! └── Screen
//!     ├── output sink (stdout)
//!     └── ByteSource (stdin) -> KeyDecoder -> Key
//! ```

pub mod color;
pub mod signals;
pub mod term;
pub mod text;
