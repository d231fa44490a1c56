use crate::error::Result;
use crate::events::{TargetWindow, WindowRect};
use tracing::info;

use super::r#trait::WindowLocatorTrait;

/// Шаг сценария: сколько тиков держать состояние
struct Phase {
    ticks: u64,
    rect: Option<(i32, i32, u32, u32)>,
    focused: bool,
}

/// Эмулирует целевое окно: появление, потеря фокуса, исчезновение, перемещение
pub struct DryRunLocator {
    phases: Vec<Phase>,
    tick: u64,
}

impl DryRunLocator {
    pub fn new() -> Self {
        Self {
            phases: vec![
                Phase { ticks: 120, rect: Some((100, 50, 800, 600)), focused: true },
                Phase { ticks: 60, rect: Some((100, 50, 800, 600)), focused: false },
                Phase { ticks: 30, rect: None, focused: false },
                Phase { ticks: 120, rect: Some((-40, 80, 1024, 768)), focused: true },
            ],
            tick: 0,
        }
    }

    fn current_phase(&self) -> &Phase {
        let cycle: u64 = self.phases.iter().map(|p| p.ticks).sum();
        let mut offset = self.tick % cycle;
        for phase in &self.phases {
            if offset < phase.ticks {
                return phase;
            }
            offset -= phase.ticks;
        }
        &self.phases[0]
    }
}

impl WindowLocatorTrait for DryRunLocator {
    fn locate(&mut self, title: &str) -> Result<Option<TargetWindow>> {
        let phase = self.current_phase();
        let window = phase
            .rect
            .and_then(|(x, y, w, h)| WindowRect::from_os(x, y, w, h))
            .map(|rect| {
                TargetWindow::new(format!("{} - dry_run", title), rect).with_focus(phase.focused)
            });

        if self.tick % 60 == 0 {
            match &window {
                Some(w) => info!("Dry-run: эмулируем окно {}", w),
                None => info!("Dry-run: эмулируем отсутствие окна"),
            }
        }

        self.tick += 1;
        Ok(window)
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
