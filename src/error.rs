use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка поиска окна: {0}")]
    WindowLocator(String),

    #[error("Ошибка захвата экрана: {0}")]
    Capture(String),

    #[error("Ошибка детектора: {0}")]
    Detector(String),

    #[error("Ошибка отрисовки: {0}")]
    Render(String),

    #[error("Не удалось создать оверлей: {0}")]
    SurfaceCreation(String),

    #[error("Ошибка оконной подсистемы: {0}")]
    Windowing(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

/// Как цикл реагирует на ошибку стадии
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Тик прерывается, цикл продолжается
    Recoverable,
    /// Немедленный teardown и выход из процесса
    Fatal,
}

impl OverlayError {
    pub fn severity(&self) -> Severity {
        match self {
            OverlayError::WindowLocator(_)
            | OverlayError::Capture(_)
            | OverlayError::Detector(_)
            | OverlayError::Render(_) => Severity::Recoverable,
            OverlayError::Config(_)
            | OverlayError::Io(_)
            | OverlayError::SurfaceCreation(_)
            | OverlayError::Windowing(_)
            | OverlayError::Internal(_) => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Короткое имя стадии для логов
    pub fn stage(&self) -> &'static str {
        match self {
            OverlayError::Config(_) => "config",
            OverlayError::Io(_) => "io",
            OverlayError::WindowLocator(_) => "locate",
            OverlayError::Capture(_) => "capture",
            OverlayError::Detector(_) => "detect",
            OverlayError::Render(_) => "render",
            OverlayError::SurfaceCreation(_) => "surface",
            OverlayError::Windowing(_) => "windowing",
            OverlayError::Internal(_) => "internal",
        }
    }
}

impl From<ort::Error> for OverlayError {
    fn from(e: ort::Error) -> Self {
        OverlayError::Detector(e.to_string())
    }
}

impl From<xcap::XCapError> for OverlayError {
    fn from(e: xcap::XCapError) -> Self {
        OverlayError::Capture(e.to_string())
    }
}

impl From<softbuffer::SoftBufferError> for OverlayError {
    fn from(e: softbuffer::SoftBufferError) -> Self {
        OverlayError::Render(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! overlay_error {
    (locator, $($arg:tt)*) => {
        $crate::error::OverlayError::WindowLocator(format!($($arg)*))
    };
    (capture, $($arg:tt)*) => {
        $crate::error::OverlayError::Capture(format!($($arg)*))
    };
    (detector, $($arg:tt)*) => {
        $crate::error::OverlayError::Detector(format!($($arg)*))
    };
    (render, $($arg:tt)*) => {
        $crate::error::OverlayError::Render(format!($($arg)*))
    };
    (surface, $($arg:tt)*) => {
        $crate::error::OverlayError::SurfaceCreation(format!($($arg)*))
    };
    (windowing, $($arg:tt)*) => {
        $crate::error::OverlayError::Windowing(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::OverlayError::Internal(format!($($arg)*))
    };
}
