use crate::error::Result;
use crate::events::WindowRect;
use tracing::info;

use super::frame::{Frame, PixelFormat};
use super::r#trait::FrameSourceTrait;

/// Dry-run источник: градиентный BGRA-кадр нужного размера
pub struct SyntheticFrameSource {
    grabs: u64,
}

impl SyntheticFrameSource {
    pub fn new() -> Self {
        Self { grabs: 0 }
    }
}

impl FrameSourceTrait for SyntheticFrameSource {
    fn grab(&mut self, rect: &WindowRect) -> Result<Frame> {
        self.grabs += 1;

        let mut data = Vec::with_capacity(rect.width as usize * rect.height as usize * 4);
        for y in 0..rect.height {
            for x in 0..rect.width {
                let b = (x * 255 / rect.width) as u8;
                let g = (y * 255 / rect.height) as u8;
                data.extend_from_slice(&[b, g, 64, 255]);
            }
        }

        Frame::new(rect.width, rect.height, PixelFormat::Bgra8, data)
    }

    fn release(&mut self) {
        if self.grabs > 0 {
            info!("Dry-run: синтетический источник выдал {} кадров", self.grabs);
            self.grabs = 0;
        }
    }
}
