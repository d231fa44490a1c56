//! Overlay Surface: the borderless, transparent, click-through, always-on-top
//! window that sits over the target application, plus its lifecycle.

mod headless;
mod lifecycle;
mod style;
mod r#trait;
mod winit_surface;

pub use self::lifecycle::OverlayLifecycle;
pub use self::r#trait::{create_overlay_factory, OverlayFactory, OverlaySurfaceTrait};
