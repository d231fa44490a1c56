use crate::config::TitleMatch;
use crate::debug_if_enabled;
use crate::error::{OverlayError, Result};
use crate::events::{TargetWindow, WindowRect};
use std::process::{Command, Output};
use tracing::debug;

use super::r#trait::WindowLocatorTrait;

/// X11 locator built on `xdotool` and `xprop`
pub struct XdotoolLocator {
    title_match: TitleMatch,
}

impl XdotoolLocator {
    pub fn new(title_match: TitleMatch) -> Self {
        Self { title_match }
    }

    pub fn test(&self) -> Result<()> {
        let output = Command::new("xdotool").arg("version").output().map_err(|e| {
            OverlayError::Windowing(format!("xdotool не найден: {}", e))
        })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(OverlayError::Windowing("xdotool failed".to_string()))
        }
    }

    fn run(program: &str, args: &[&str]) -> Result<Output> {
        Command::new(program).args(args).output().map_err(|e| {
            debug!("{} не найден или не работает: {}", program, e);
            OverlayError::WindowLocator(format!("{} не найден: {}", program, e))
        })
    }

    fn search(&self, title: &str) -> Result<Vec<u64>> {
        let pattern = regex_escape(title);
        let output = Self::run("xdotool", &["search", "--onlyvisible", "--name", &pattern])?;

        // xdotool возвращает 1, если ничего не найдено
        if !output.status.success() {
            return Ok(Vec::new());
        }

        Ok(parse_window_ids(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Заголовок, геометрия и активное окно одной цепочкой xdotool.
    ///
    /// `None`, если окно успело закрыться после `search`.
    fn describe(&self, id: u64) -> Result<Option<WindowDescription>> {
        let id = id.to_string();
        let output = Self::run(
            "xdotool",
            &["getwindowname", &id, "getwindowgeometry", "--shell", &id, "getactivewindow"],
        )?;

        // без активного окна цепочка завершается с ошибкой, но вывод до неё валиден
        let description = parse_description(&String::from_utf8_lossy(&output.stdout));
        if description.is_none() {
            debug!("Окно {} исчезло до запроса свойств", id);
        }
        Ok(description)
    }

    fn is_minimized(&self, id: u64) -> bool {
        match Self::run("xprop", &["-id", &id.to_string(), "_NET_WM_STATE"]) {
            Ok(output) if output.status.success() => {
                is_hidden_state(&String::from_utf8_lossy(&output.stdout))
            }
            _ => {
                debug!("xprop недоступен, считаем окно {} развёрнутым", id);
                false
            }
        }
    }
}

impl WindowLocatorTrait for XdotoolLocator {
    fn locate(&mut self, title: &str) -> Result<Option<TargetWindow>> {
        for id in self.search(title)? {
            let Some(window) = self.describe(id)? else {
                continue;
            };
            if !self.title_match.matches(&window.name, title) {
                continue;
            }

            // Первое совпадение выигрывает, даже если оно свёрнуто
            if self.is_minimized(id) {
                debug_if_enabled!("Окно {} ({}) свёрнуто", window.name, id);
                return Ok(None);
            }

            let (x, y, width, height) = window.geometry;
            let Some(rect) = WindowRect::from_os(x, y, width, height) else {
                return Ok(None);
            };

            let focused = window.active == Some(id);
            return Ok(Some(TargetWindow::new(window.name, rect).with_focus(focused)));
        }

        Ok(None)
    }

    fn name(&self) -> &'static str {
        "xdotool"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WindowDescription {
    name: String,
    geometry: (i32, i32, u32, u32),
    active: Option<u64>,
}

/// Разбирает вывод `getwindowname ... getwindowgeometry --shell ... getactivewindow`:
/// первая строка - заголовок, затем пары KEY=VALUE, затем id активного окна.
fn parse_description(stdout: &str) -> Option<WindowDescription> {
    let mut lines = stdout.lines();
    let name = lines.next()?.trim().to_string();
    let rest: Vec<&str> = lines.collect();

    let geometry = parse_geometry(&rest.join("\n"))?;
    let active = rest
        .last()
        .filter(|line| !line.contains('='))
        .and_then(|line| line.trim().parse().ok());

    Some(WindowDescription {
        name,
        geometry,
        active,
    })
}

/// Экранирует заголовок для regex-поиска xdotool
fn regex_escape(title: &str) -> String {
    let mut escaped = String::with_capacity(title.len());
    for c in title.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_window_ids(stdout: &str) -> Vec<u64> {
    stdout
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}

fn parse_geometry(stdout: &str) -> Option<(i32, i32, u32, u32)> {
    let mut x = None;
    let mut y = None;
    let mut width = None;
    let mut height = None;

    for line in stdout.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "X" => x = value.parse().ok(),
            "Y" => y = value.parse().ok(),
            "WIDTH" => width = value.parse().ok(),
            "HEIGHT" => height = value.parse().ok(),
            _ => {}
        }
    }

    Some((x?, y?, width?, height?))
}

fn is_hidden_state(stdout: &str) -> bool {
    stdout.contains("_NET_WM_STATE_HIDDEN")
}
