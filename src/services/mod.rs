pub mod detector;
pub mod frame_source;
pub mod loop_controller;
pub mod overlay;
pub mod render;
pub mod window_locator;

pub use detector::create_detector;
pub use frame_source::create_frame_source;
pub use loop_controller::{Collaborators, LoopController};
pub use overlay::create_overlay_factory;
pub use window_locator::create_window_locator;
