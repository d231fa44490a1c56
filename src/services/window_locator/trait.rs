use crate::config::{Config, TitleMatch};
use crate::error::{OverlayError, Result};
use crate::events::TargetWindow;
use std::sync::Arc;
use tracing::{info, warn};

/// Trait for window locators backed by different OS query mechanisms
pub trait WindowLocatorTrait {
    /// Find the first top-level window whose title matches `title`.
    ///
    /// `Ok(None)` means the window is absent or minimized; this is an expected
    /// outcome, not an error.
    fn locate(&mut self, title: &str) -> Result<Option<TargetWindow>>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Factory function to create an appropriate window locator based on config and the dry_run flag
pub fn create_window_locator(
    config: Arc<Config>,
    dry_run: bool,
) -> Result<Box<dyn WindowLocatorTrait>> {
    if dry_run {
        return Ok(Box::new(super::dry_run::DryRunLocator::new()));
    }

    let title_match = config.target.title_match;
    let backend = match config.target.backend.as_str() {
        "auto" => default_backend(),
        other => other,
    };

    info!("Поиск окна через backend: {}", backend);
    create_backend(backend, title_match)
}

fn default_backend() -> &'static str {
    if cfg!(windows) {
        "win32"
    } else {
        if std::env::var("XDG_SESSION_TYPE").as_deref() == Ok("wayland") {
            warn!("Wayland-сессия: xdotool видит только окна XWayland");
        }
        "xdotool"
    }
}

#[cfg(windows)]
fn create_backend(backend: &str, title_match: TitleMatch) -> Result<Box<dyn WindowLocatorTrait>> {
    match backend {
        "win32" => Ok(Box::new(super::win32::Win32Locator::new(title_match))),
        "xdotool" => Ok(Box::new(super::xdotool::XdotoolLocator::new(title_match))),
        other => Err(OverlayError::Internal(format!("Неизвестный backend: {}", other))),
    }
}

#[cfg(not(windows))]
fn create_backend(backend: &str, title_match: TitleMatch) -> Result<Box<dyn WindowLocatorTrait>> {
    match backend {
        "xdotool" => {
            let locator = super::xdotool::XdotoolLocator::new(title_match);
            locator.test()?;
            Ok(Box::new(locator))
        }
        other => Err(OverlayError::Internal(format!(
            "Backend {} недоступен на этой платформе",
            other
        ))),
    }
}
