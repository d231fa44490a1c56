//! LoopController: the single control loop that owns every other component.
//!
//! Waits for the target window, creates the overlay, then runs paced ticks of
//! track -> capture -> detect -> render until Ctrl+C, an overlay close request,
//! or a fatal error. Teardown happens here and nowhere else.

mod controller;
mod diagnostics;
mod pacer;
mod state;

pub use self::controller::{Collaborators, LoopController};
