use crate::error::Result;
use crate::overlay_error;
use winit::window::Window;

/// Делает окно оверлея прозрачным для ввода (click-through).
///
/// Одна реализация на платформу; цикл знает только этот интерфейс.
pub trait SurfaceStyler {
    fn apply(&self, window: &Window) -> Result<()>;

    fn name(&self) -> &'static str;
}

pub fn platform_styler() -> Box<dyn SurfaceStyler> {
    #[cfg(windows)]
    {
        Box::new(win32::LayeredStyler)
    }

    #[cfg(not(windows))]
    {
        Box::new(HitTestStyler)
    }
}

/// Переносимый вариант: отключение hit-test курсора средствами winit
pub struct HitTestStyler;

impl SurfaceStyler for HitTestStyler {
    fn apply(&self, window: &Window) -> Result<()> {
        window
            .set_cursor_hittest(false)
            .map_err(|e| overlay_error!(surface, "Не удалось отключить hit-test: {}", e))
    }

    fn name(&self) -> &'static str {
        "hittest"
    }
}

#[cfg(windows)]
mod win32 {
    use super::{HitTestStyler, SurfaceStyler};
    use crate::error::Result;
    use crate::overlay_error;
    use windows::Win32::{Foundation::*, UI::WindowsAndMessaging::*};
    use winit::raw_window_handle::{HasWindowHandle, RawWindowHandle};
    use winit::window::Window;

    /// WS_EX_LAYERED | WS_EX_TRANSPARENT, чёрный как цветовой ключ
    pub struct LayeredStyler;

    impl SurfaceStyler for LayeredStyler {
        fn apply(&self, window: &Window) -> Result<()> {
            // winit пересобирает ex-стиль сам, поэтому его вызов идёт первым
            HitTestStyler.apply(window)?;

            let handle = window
                .window_handle()
                .map_err(|e| overlay_error!(surface, "Нет дескриптора окна: {}", e))?;
            let RawWindowHandle::Win32(handle) = handle.as_raw() else {
                return Err(overlay_error!(surface, "Ожидался Win32-дескриптор окна"));
            };
            let hwnd = HWND(handle.hwnd.get() as *mut std::ffi::c_void);

            unsafe {
                let ex_style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
                let layered = (WS_EX_LAYERED.0 | WS_EX_TRANSPARENT.0) as isize;
                SetWindowLongPtrW(hwnd, GWL_EXSTYLE, ex_style | layered);

                SetLayeredWindowAttributes(hwnd, COLORREF(0), 255, LWA_COLORKEY | LWA_ALPHA)
                    .map_err(|e| overlay_error!(surface, "SetLayeredWindowAttributes: {}", e))?;
            }

            Ok(())
        }

        fn name(&self) -> &'static str {
            "win32-layered"
        }
    }
}
