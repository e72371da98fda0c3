//! Study/break session logic.
//!
//! - **phase**: the study / short break / long break cycle
//! - **timer**: pausable wall-clock phase timer
//! - **state**: session state, snapshots and the flags shared between loops
//! - **scheduler**: the render, advance, persist and input loops

pub mod phase;
pub mod scheduler;
pub mod state;
pub mod timer;

pub use phase::{PhaseCycle, PhaseKind};
pub use scheduler::Scheduler;
pub use state::{SessionSnapshot, SessionState, SharedSession};
