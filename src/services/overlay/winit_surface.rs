use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::WindowRect;
use crate::overlay_error;
use crate::services::render::{pack_argb, rasterize, DrawList};
use softbuffer::{Context, Surface};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tiny_skia::Pixmap;
use tracing::{debug, info};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use super::style::SurfaceStyler;
use super::r#trait::{OverlayFactory, OverlaySurfaceTrait};

/// Обработчик событий: создаёт окно в `resumed` и ловит запрос закрытия
struct OverlayApp {
    attributes: Option<WindowAttributes>,
    window: Option<Arc<Window>>,
    create_error: Option<String>,
    close_requested: bool,
}

impl OverlayApp {
    fn new(attributes: WindowAttributes) -> Self {
        Self {
            attributes: Some(attributes),
            window: None,
            create_error: None,
            close_requested: false,
        }
    }
}

impl ApplicationHandler for OverlayApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(attributes) = self.attributes.take() else {
            return;
        };

        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => self.create_error = Some(e.to_string()),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                debug!("Оверлей: получен запрос закрытия");
                self.close_requested = true;
            }
            _ => {}
        }
    }
}

fn non_zero(value: u32) -> Result<NonZeroU32> {
    NonZeroU32::new(value).ok_or_else(|| overlay_error!(render, "Нулевой размер поверхности"))
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height)
        .ok_or_else(|| overlay_error!(render, "Не удалось выделить pixmap {}x{}", width, height))
}

/// Оверлей на winit + softbuffer.
///
/// Поля обнуляются в `shutdown` в порядке teardown: поверхность и контекст
/// рендера, окно, цикл событий.
pub struct WinitOverlay {
    surface: Option<Surface<Arc<Window>, Arc<Window>>>,
    context: Option<Context<Arc<Window>>>,
    app: OverlayApp,
    event_loop: Option<EventLoop<()>>,
    pixmap: Pixmap,
    size: (u32, u32),
}

impl WinitOverlay {
    /// Атомарное создание: при ошибке на любом шаге уже созданное
    /// освобождается при выходе из функции.
    pub fn create(rect: &WindowRect, styler: &dyn SurfaceStyler) -> Result<Self> {
        let mut event_loop = EventLoop::new()
            .map_err(|e| overlay_error!(surface, "Не удалось инициализировать цикл событий: {}", e))?;

        let attributes = Window::default_attributes()
            .with_title("Overlay")
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false)
            .with_active(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(PhysicalSize::new(rect.width, rect.height))
            .with_position(PhysicalPosition::new(rect.left as i32, rect.top as i32));

        // первый проход цикла событий создаёт окно в resumed()
        let mut app = OverlayApp::new(attributes);
        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut app) {
            return Err(overlay_error!(surface, "Цикл событий завершился при старте: {}", code));
        }
        if let Some(e) = app.create_error.take() {
            return Err(overlay_error!(surface, "Не удалось создать окно: {}", e));
        }
        let window = app
            .window
            .clone()
            .ok_or_else(|| overlay_error!(surface, "Окно оверлея не было создано"))?;

        let context = Context::new(window.clone())
            .map_err(|e| overlay_error!(surface, "Не удалось создать контекст рендера: {}", e))?;
        let mut surface = Surface::new(&context, window.clone())
            .map_err(|e| overlay_error!(surface, "Не удалось создать поверхность: {}", e))?;
        surface
            .resize(non_zero(rect.width)?, non_zero(rect.height)?)
            .map_err(|e| overlay_error!(surface, "Не удалось задать размер поверхности: {}", e))?;

        styler.apply(&window)?;
        info!("Оверлей {} создан, стиль: {}", rect, styler.name());

        Ok(Self {
            surface: Some(surface),
            context: Some(context),
            app,
            event_loop: Some(event_loop),
            pixmap: new_pixmap(rect.width, rect.height)?,
            size: (rect.width, rect.height),
        })
    }

    fn window(&self) -> Result<&Arc<Window>> {
        self.app
            .window
            .as_ref()
            .ok_or_else(|| overlay_error!(windowing, "Окно оверлея уже уничтожено"))
    }
}

impl OverlaySurfaceTrait for WinitOverlay {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.size == (width, height) {
            return Ok(());
        }

        let _ = self.window()?.request_inner_size(PhysicalSize::new(width, height));
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(non_zero(width)?, non_zero(height)?)?;
        }
        self.pixmap = new_pixmap(width, height)?;
        self.size = (width, height);

        debug!("Оверлей: новый размер {}x{}", width, height);
        Ok(())
    }

    fn set_position(&mut self, left: u32, top: u32) -> Result<()> {
        self.window()?
            .set_outer_position(PhysicalPosition::new(left as i32, top as i32));
        Ok(())
    }

    fn poll_events(&mut self) -> Result<bool> {
        let event_loop = self
            .event_loop
            .as_mut()
            .ok_or_else(|| overlay_error!(windowing, "Цикл событий уже остановлен"))?;

        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.app) {
            debug!("Цикл событий завершился с кодом {}", code);
            self.app.close_requested = true;
        }

        Ok(self.app.close_requested)
    }

    fn present(&mut self, list: &DrawList) -> Result<()> {
        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| overlay_error!(windowing, "Поверхность уже освобождена"))?;

        rasterize(list, &mut self.pixmap);

        let mut buffer = surface.buffer_mut()?;
        pack_argb(&self.pixmap, &mut buffer);
        buffer.present()?;

        debug_if_enabled!("Оверлей: кадр показан, {} команд", list.commands.len());
        Ok(())
    }

    fn shutdown(&mut self) {
        drop(self.surface.take());
        drop(self.context.take());
        drop(self.app.window.take());
        drop(self.event_loop.take());
        info!("Оверлей уничтожен");
    }
}

pub struct WinitFactory {
    styler: Box<dyn SurfaceStyler>,
}

impl WinitFactory {
    pub fn new(styler: Box<dyn SurfaceStyler>) -> Self {
        Self { styler }
    }
}

impl OverlayFactory for WinitFactory {
    fn create(&mut self, rect: &WindowRect) -> Result<Box<dyn OverlaySurfaceTrait>> {
        Ok(Box::new(WinitOverlay::create(rect, self.styler.as_ref())?))
    }
}
