use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub target: TargetConfig,
    pub model: ModelConfig,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleMatch {
    Substring,
    Exact,
}

impl TitleMatch {
    /// Регистрозависимое сравнение заголовка с образцом
    pub fn matches(&self, title: &str, pattern: &str) -> bool {
        match self {
            TitleMatch::Substring => title.contains(pattern),
            TitleMatch::Exact => title == pattern,
        }
    }
}

/// Устройство для инференса
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// CUDA, если доступна, иначе CPU
    #[default]
    Auto,
    Cpu,
    Cuda,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    pub window_title: String,
    pub title_match: TitleMatch,
    pub wait_interval_ms: u64,
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub device: Device,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub overlap_threshold: f32,
    #[serde(default)]
    pub class_filter: Vec<usize>,
    #[serde(default)]
    pub class_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverlayConfig {
    pub target_fps: u32,
    pub diagnostics_interval: u64,
    pub confidence_color_threshold: f32,
    pub box_thickness: f32,
    pub label_scale: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            target: TargetConfig {
                window_title: "AssaultCube".to_string(),
                title_match: TitleMatch::Substring,
                wait_interval_ms: 1000,
                backend: "auto".to_string(),
            },
            model: ModelConfig {
                path: PathBuf::from("yolov8n.onnx"),
                device: Device::Auto,
                input_size: 640,
                confidence_threshold: 0.2,
                overlap_threshold: 0.4,
                class_filter: Vec::new(),
                class_names: Vec::new(),
            },
            overlay: OverlayConfig {
                target_fps: 60,
                diagnostics_interval: 30,
                confidence_color_threshold: 0.7,
                box_thickness: 2.0,
                label_scale: 2,
            },
        }
    }
}

impl Config {
    /// Загружает конфигурацию: значения по умолчанию < TOML-файл < переменные OVERLAY_*
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("OVERLAY_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация целевого окна
        if self.target.window_title.is_empty() {
            anyhow::bail!("window_title не может быть пустым");
        }

        if self.target.wait_interval_ms < 100 {
            anyhow::bail!("wait_interval_ms должно быть минимум 100");
        }

        match self.target.backend.as_str() {
            "auto" | "xdotool" | "win32" => {}
            _ => anyhow::bail!("Неверный backend поиска окна: {}", self.target.backend),
        }

        // Валидация модели
        if self.model.input_size == 0 || self.model.input_size % 32 != 0 {
            anyhow::bail!(
                "input_size должно быть положительным и кратным 32: {}",
                self.model.input_size
            );
        }

        if !(self.model.confidence_threshold > 0.0 && self.model.confidence_threshold <= 1.0) {
            anyhow::bail!(
                "confidence_threshold должно быть в (0, 1]: {}",
                self.model.confidence_threshold
            );
        }

        if !(self.model.overlap_threshold > 0.0 && self.model.overlap_threshold <= 1.0) {
            anyhow::bail!(
                "overlap_threshold должно быть в (0, 1]: {}",
                self.model.overlap_threshold
            );
        }

        // Валидация оверлея
        if self.overlay.target_fps == 0 || self.overlay.target_fps > 240 {
            anyhow::bail!("target_fps должно быть в диапазоне 1..=240: {}", self.overlay.target_fps);
        }

        if self.overlay.diagnostics_interval == 0 {
            anyhow::bail!("diagnostics_interval должно быть больше 0");
        }

        if !(0.0..=1.0).contains(&self.overlay.confidence_color_threshold) {
            anyhow::bail!(
                "confidence_color_threshold должно быть в [0, 1]: {}",
                self.overlay.confidence_color_threshold
            );
        }

        if self.overlay.box_thickness <= 0.0 {
            anyhow::bail!("box_thickness должно быть больше 0");
        }

        if self.overlay.label_scale == 0 {
            anyhow::bail!("label_scale должно быть больше 0");
        }

        Ok(())
    }

    /// Бюджет одного тика: 1 / target_fps
    pub fn tick_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.overlay.target_fps))
    }

    pub fn wait_interval(&self) -> Duration {
        Duration::from_millis(self.target.wait_interval_ms)
    }

    /// Фильтр классов; пустой означает "все классы"
    pub fn class_filter(&self) -> Option<SmallVec<[usize; 8]>> {
        if self.model.class_filter.is_empty() {
            None
        } else {
            Some(self.model.class_filter.iter().copied().collect())
        }
    }
}
