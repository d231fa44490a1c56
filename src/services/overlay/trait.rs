use crate::error::Result;
use crate::events::WindowRect;
use crate::services::render::DrawList;
use tracing::info;

/// OS-окно оверлея вместе с контекстом рендера
pub trait OverlaySurfaceTrait {
    /// Текущий размер поверхности
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    fn set_position(&mut self, left: u32, top: u32) -> Result<()>;

    /// Обрабатывает накопленные события окна. `true` - запрошено закрытие.
    fn poll_events(&mut self) -> Result<bool>;

    /// Очищает поверхность до прозрачной, рисует список и показывает кадр
    fn present(&mut self, list: &DrawList) -> Result<()>;

    /// Teardown: контекст рендера, затем окно, затем оконная подсистема
    fn shutdown(&mut self);
}

/// Создаёт поверхность один раз, когда целевое окно впервые найдено
pub trait OverlayFactory {
    fn create(&mut self, rect: &WindowRect) -> Result<Box<dyn OverlaySurfaceTrait>>;
}

/// Factory function to create an overlay factory based on the dry_run flag
pub fn create_overlay_factory(dry_run: bool) -> Box<dyn OverlayFactory> {
    if dry_run {
        info!("Оверлей: headless-поверхность (dry-run)");
        Box::new(super::headless::HeadlessFactory)
    } else {
        Box::new(super::winit_surface::WinitFactory::new(super::style::platform_styler()))
    }
}
