use serde::{Deserialize, Serialize};
use std::fmt;

/// Прямоугольник целевого окна в экранных координатах.
///
/// `left`/`top` никогда не отрицательны: частично ушедшее за экран окно
/// захватывается с видимого начала.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl WindowRect {
    /// Строит прямоугольник из сырых координат ОС.
    ///
    /// Возвращает `None` для вырожденного размера: такое окно считается отсутствующим.
    pub fn from_os(x: i32, y: i32, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        Some(Self {
            left: x.max(0) as u32,
            top: y.max(0) as u32,
            width,
            height,
        })
    }

    pub fn same_size(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

impl fmt::Display for WindowRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.left, self.top)
    }
}

/// Найденное целевое окно: геометрия и фокус
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetWindow {
    pub title: String,
    pub rect: WindowRect,
    pub focused: bool,
}

impl TargetWindow {
    pub fn new(title: String, rect: WindowRect) -> Self {
        Self {
            title,
            rect,
            focused: false,
        }
    }

    pub fn with_focus(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl fmt::Display for TargetWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" {}{}",
            self.title,
            self.rect,
            if self.focused { " (focused)" } else { "" }
        )
    }
}
