mod frame;
mod synthetic;
mod r#trait;
mod xcap_source;

pub use self::frame::{Frame, PixelFormat};
pub use self::r#trait::{create_frame_source, FrameSourceTrait};
