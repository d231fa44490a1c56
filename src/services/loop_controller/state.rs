use crate::config::Config;
use crate::events::WindowRect;

use super::diagnostics::Diagnostics;
use super::pacer::Pacer;

/// Изменяемое состояние цикла; принадлежит только контроллеру
#[derive(Debug, Clone)]
pub struct LoopState {
    /// Последняя известная геометрия цели; `None`, пока окно отсутствует
    pub current_rect: Option<WindowRect>,
    pub target_focused: bool,
    pub close_requested: bool,
    pub pacer: Pacer,
    pub diagnostics: Diagnostics,
}

impl LoopState {
    pub fn new(config: &Config) -> Self {
        Self {
            current_rect: None,
            target_focused: false,
            close_requested: false,
            pacer: Pacer::new(config.tick_budget()),
            diagnostics: Diagnostics::new(config.overlay.diagnostics_interval),
        }
    }
}
