use crate::error::{OverlayError, Result};
use image::RgbImage;

/// Порядок каналов в сыром буфере кадра
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bgra8,
    Rgba8,
}

/// Снимок области экрана, начало координат в левом верхнем углу
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(OverlayError::Capture(format!(
                "Размер буфера {} не совпадает с {}x{}x4",
                data.len(),
                width,
                height
            )));
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Конвертация в RGB, которого ждёт детектор. Альфа отбрасывается.
    pub fn to_rgb(&self) -> Result<RgbImage> {
        let (r, g, b) = match self.format {
            PixelFormat::Bgra8 => (2, 1, 0),
            PixelFormat::Rgba8 => (0, 1, 2),
        };

        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in self.data.chunks_exact(4) {
            rgb.extend_from_slice(&[px[r], px[g], px[b]]);
        }

        RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| OverlayError::Capture("Не удалось собрать RGB-кадр".to_string()))
    }
}
