use crate::error::Result;
use crate::events::WindowRect;
use tracing::{error, info};

use super::r#trait::{OverlayFactory, OverlaySurfaceTrait};

/// Uninitialized -> Active -> Destroyed.
///
/// Created и Active совмещены: успешное создание сразу даёт Active.
pub enum OverlayState {
    Uninitialized,
    Active(Box<dyn OverlaySurfaceTrait>),
    Destroyed,
}

impl OverlayState {
    pub fn name(&self) -> &'static str {
        match self {
            OverlayState::Uninitialized => "Uninitialized",
            OverlayState::Active(_) => "Active",
            OverlayState::Destroyed => "Destroyed",
        }
    }
}

/// Владеет поверхностью оверлея всё время жизни процесса.
///
/// Teardown выполняется ровно один раз: явным `shutdown` или из `Drop`.
pub struct OverlayLifecycle {
    state: OverlayState,
}

impl OverlayLifecycle {
    pub fn new() -> Self {
        Self {
            state: OverlayState::Uninitialized,
        }
    }

    /// Создаёт поверхность под прямоугольник целевого окна.
    ///
    /// Ошибка фатальна: состояние уходит в Destroyed без повторных попыток.
    pub fn activate(&mut self, factory: &mut dyn OverlayFactory, rect: &WindowRect) -> Result<()> {
        if !matches!(self.state, OverlayState::Uninitialized) {
            return Err(crate::overlay_error!(
                internal,
                "Повторное создание оверлея из состояния {}",
                self.state.name()
            ));
        }

        match factory.create(rect) {
            Ok(surface) => {
                self.state = OverlayState::Active(surface);
                Ok(())
            }
            Err(e) => {
                error!("Создание оверлея не удалось: {}", e);
                self.state = OverlayState::Destroyed;
                Err(e)
            }
        }
    }

    pub fn surface_mut(&mut self) -> Option<&mut (dyn OverlaySurfaceTrait + 'static)> {
        match &mut self.state {
            OverlayState::Active(surface) => Some(surface.as_mut()),
            _ => None,
        }
    }

    /// Возвращает `true`, если teardown поверхности действительно выполнялся
    pub fn shutdown(&mut self) -> bool {
        match std::mem::replace(&mut self.state, OverlayState::Destroyed) {
            OverlayState::Active(mut surface) => {
                surface.shutdown();
                true
            }
            OverlayState::Uninitialized => {
                info!("Оверлей не успел создаться, teardown поверхности не нужен");
                false
            }
            OverlayState::Destroyed => false,
        }
    }
}

impl Drop for OverlayLifecycle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
