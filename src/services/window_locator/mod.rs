//! WindowLocator service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for querying the OS for the
//! target window (geometry, minimized and focused state). They never mutate any
//! window and never decide what the overlay does with the answer; the skip/degrade
//! policy lives exclusively in the LoopController.

mod dry_run;
mod r#trait;
#[cfg(windows)]
mod win32;
mod xdotool;

pub use self::r#trait::{create_window_locator, WindowLocatorTrait};
