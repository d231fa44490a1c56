use crate::error::Result;
use crate::events::WindowRect;
use crate::services::render::DrawList;
use tracing::info;

use super::r#trait::{OverlayFactory, OverlaySurfaceTrait};

/// Dry-run поверхность без окна: запоминает последний показанный кадр
pub struct HeadlessOverlay {
    size: (u32, u32),
    position: (u32, u32),
    presents: u64,
    last_frame: Option<DrawList>,
}

impl HeadlessOverlay {
    pub fn new(rect: &WindowRect) -> Self {
        Self {
            size: (rect.width, rect.height),
            position: (rect.left, rect.top),
            presents: 0,
            last_frame: None,
        }
    }

    #[cfg(test)]
    pub fn last_frame(&self) -> Option<&DrawList> {
        self.last_frame.as_ref()
    }
}

impl OverlaySurfaceTrait for HeadlessOverlay {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.size != (width, height) {
            info!("Dry-run: оверлей {}x{} -> {}x{}", self.size.0, self.size.1, width, height);
            self.size = (width, height);
        }
        Ok(())
    }

    fn set_position(&mut self, left: u32, top: u32) -> Result<()> {
        self.position = (left, top);
        Ok(())
    }

    fn poll_events(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn present(&mut self, list: &DrawList) -> Result<()> {
        self.presents += 1;
        if self.presents % 120 == 1 {
            info!(
                "Dry-run: кадр #{} в ({}, {}): {} рамок {:?}",
                self.presents,
                self.position.0,
                self.position.1,
                list.box_count(),
                list.labels().collect::<Vec<_>>()
            );
        }
        self.last_frame = Some(list.clone());
        Ok(())
    }

    fn shutdown(&mut self) {
        info!("Dry-run: оверлей уничтожен после {} кадров", self.presents);
        self.last_frame = None;
    }
}

pub struct HeadlessFactory;

impl OverlayFactory for HeadlessFactory {
    fn create(&mut self, rect: &WindowRect) -> Result<Box<dyn OverlaySurfaceTrait>> {
        info!("Dry-run: оверлей создан {}", rect);
        Ok(Box::new(HeadlessOverlay::new(rect)))
    }
}
