use crate::config::TitleMatch;
use crate::debug_if_enabled;
use crate::error::{OverlayError, Result};
use crate::events::{TargetWindow, WindowRect};
use windows::{
    core::*,
    Win32::{Foundation::*, UI::WindowsAndMessaging::*},
};

use super::r#trait::WindowLocatorTrait;

/// Windows locator built on `EnumWindows`
pub struct Win32Locator {
    title_match: TitleMatch,
}

struct Candidate {
    hwnd: HWND,
    title: String,
}

impl Win32Locator {
    pub fn new(title_match: TitleMatch) -> Self {
        Self { title_match }
    }

    fn enumerate() -> Result<Vec<Candidate>> {
        let mut candidates: Vec<Candidate> = Vec::new();
        unsafe {
            EnumWindows(
                Some(enum_windows_proc),
                LPARAM(&mut candidates as *mut _ as isize),
            )
            .map_err(|e| OverlayError::WindowLocator(format!("EnumWindows: {}", e)))?;
        }
        Ok(candidates)
    }
}

impl WindowLocatorTrait for Win32Locator {
    fn locate(&mut self, title: &str) -> Result<Option<TargetWindow>> {
        let candidates = Self::enumerate()?;
        let Some(candidate) = candidates
            .into_iter()
            .find(|c| self.title_match.matches(&c.title, title))
        else {
            return Ok(None);
        };

        unsafe {
            if IsIconic(candidate.hwnd).as_bool() {
                debug_if_enabled!("Окно {} свёрнуто", candidate.title);
                return Ok(None);
            }

            let mut rect = RECT::default();
            GetWindowRect(candidate.hwnd, &mut rect)
                .map_err(|e| OverlayError::WindowLocator(format!("GetWindowRect: {}", e)))?;

            let width = (rect.right - rect.left).max(0) as u32;
            let height = (rect.bottom - rect.top).max(0) as u32;
            let Some(rect) = WindowRect::from_os(rect.left, rect.top, width, height) else {
                return Ok(None);
            };

            let focused = GetForegroundWindow() == candidate.hwnd;
            Ok(Some(TargetWindow::new(candidate.title, rect).with_focus(focused)))
        }
    }

    fn name(&self) -> &'static str {
        "win32"
    }
}

/// EnumWindows callback: собирает видимые окна с непустым заголовком
unsafe extern "system" fn enum_windows_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
    unsafe {
        let candidates = &mut *(lparam.0 as *mut Vec<Candidate>);

        if !IsWindowVisible(hwnd).as_bool() {
            return TRUE;
        }

        let mut title_buffer = [0u16; 256];
        let title_len = GetWindowTextW(hwnd, &mut title_buffer);
        if title_len > 0 {
            candidates.push(Candidate {
                hwnd,
                title: String::from_utf16_lossy(&title_buffer[..title_len as usize]),
            });
        }

        TRUE // продолжаем перечисление
    }
}
