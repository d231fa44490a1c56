use crate::error::Result;
use crate::events::WindowRect;
use tracing::info;

use super::frame::Frame;

/// Источник снимков области экрана
pub trait FrameSourceTrait {
    /// Снимок прямоугольника `rect` в экранных координатах
    fn grab(&mut self, rect: &WindowRect) -> Result<Frame>;

    /// Освобождает ресурсы бэкенда захвата. Повторный вызов безопасен.
    fn release(&mut self);
}

/// Factory function to create a frame source based on the dry_run flag
pub fn create_frame_source(dry_run: bool) -> Box<dyn FrameSourceTrait> {
    if dry_run {
        info!("Захват экрана: синтетические кадры (dry-run)");
        Box::new(super::synthetic::SyntheticFrameSource::new())
    } else {
        info!("Захват экрана: xcap");
        Box::new(super::xcap_source::XcapFrameSource::new())
    }
}
