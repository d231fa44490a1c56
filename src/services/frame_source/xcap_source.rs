use crate::debug_if_enabled;
use crate::error::{OverlayError, Result};
use crate::events::WindowRect;
use image::imageops;
use tracing::debug;
use xcap::Monitor;

use super::frame::{Frame, PixelFormat};
use super::r#trait::FrameSourceTrait;

/// Захват через xcap: снимок монитора с окном и вырезка прямоугольника
pub struct XcapFrameSource {
    monitor: Option<Monitor>,
}

impl XcapFrameSource {
    pub fn new() -> Self {
        Self { monitor: None }
    }

    /// Монитор кэшируется, пока окно остаётся в его пределах
    fn monitor_for(&mut self, rect: &WindowRect) -> Result<&Monitor> {
        let (x, y) = (rect.left as i32, rect.top as i32);
        let stale = match &self.monitor {
            Some(m) => !contains(m, x, y),
            None => true,
        };

        if stale {
            let monitor = Monitor::from_point(x, y)?;
            debug!("Монитор для захвата: {} ({}x{})", monitor.name(), monitor.width(), monitor.height());
            self.monitor = Some(monitor);
        }

        self.monitor
            .as_ref()
            .ok_or_else(|| OverlayError::Capture("Монитор не найден".to_string()))
    }
}

fn contains(monitor: &Monitor, x: i32, y: i32) -> bool {
    x >= monitor.x()
        && y >= monitor.y()
        && x < monitor.x() + monitor.width() as i32
        && y < monitor.y() + monitor.height() as i32
}

impl FrameSourceTrait for XcapFrameSource {
    fn grab(&mut self, rect: &WindowRect) -> Result<Frame> {
        let monitor = self.monitor_for(rect)?;
        let (origin_x, origin_y) = (monitor.x(), monitor.y());
        let screen = monitor.capture_image()?;

        let (x, y, width, height) = crop_region(
            rect,
            origin_x,
            origin_y,
            screen.width(),
            screen.height(),
        )
        .ok_or_else(|| OverlayError::Capture(format!("Окно {} вне монитора", rect)))?;

        debug_if_enabled!("Захват {}x{} с ({}, {})", width, height, x, y);

        let cropped = imageops::crop_imm(&screen, x, y, width, height).to_image();
        Frame::new(width, height, PixelFormat::Rgba8, cropped.into_raw())
    }

    fn release(&mut self) {
        if self.monitor.take().is_some() {
            debug!("xcap: кэш монитора освобождён");
        }
    }
}

/// Пересечение окна с изображением монитора в локальных координатах монитора
fn crop_region(
    rect: &WindowRect,
    origin_x: i32,
    origin_y: i32,
    screen_width: u32,
    screen_height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let x = (rect.left as i64 - origin_x as i64).max(0) as u32;
    let y = (rect.top as i64 - origin_y as i64).max(0) as u32;
    if x >= screen_width || y >= screen_height {
        return None;
    }

    let width = rect.width.min(screen_width - x);
    let height = rect.height.min(screen_height - y);
    Some((x, y, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: u32, top: u32, width: u32, height: u32) -> WindowRect {
        WindowRect { left, top, width, height }
    }

    #[test]
    fn test_crop_inside_monitor() {
        assert_eq!(
            crop_region(&rect(100, 50, 800, 600), 0, 0, 1920, 1080),
            Some((100, 50, 800, 600))
        );
    }

    #[test]
    fn test_crop_on_secondary_monitor() {
        assert_eq!(
            crop_region(&rect(2000, 100, 640, 480), 1920, 0, 1920, 1080),
            Some((80, 100, 640, 480))
        );
    }

    #[test]
    fn test_crop_is_clamped_to_monitor_edge() {
        assert_eq!(
            crop_region(&rect(1500, 900, 800, 600), 0, 0, 1920, 1080),
            Some((1500, 900, 420, 180))
        );
    }

    #[test]
    fn test_crop_outside_monitor() {
        assert_eq!(crop_region(&rect(1920, 0, 100, 100), 0, 0, 1920, 1080), None);
    }
}
