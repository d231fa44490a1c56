pub mod detection;
pub mod window;

pub use detection::{BoundingBox, Detection};
pub use window::{TargetWindow, WindowRect};
