//! Window toolkit and the screens built from it.
//!
//! - **window**: bordered text window with auto-sizing and alignment
//! - **dialog**: modal yes/no dialog
//! - **panels**: the main screen layout

pub mod dialog;
pub mod panels;
pub mod window;

pub use dialog::confirm;
pub use panels::{Panels, Y_BORDER};
