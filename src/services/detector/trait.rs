use crate::config::Config;
use crate::error::Result;
use crate::events::Detection;
use image::RgbImage;
use smallvec::SmallVec;
use tracing::info;

use super::class_names::ClassNames;

/// Пороги одного вызова детектора
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceParams {
    pub confidence_threshold: f32,
    pub overlap_threshold: f32,
    pub class_filter: Option<SmallVec<[usize; 8]>>,
}

impl InferenceParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            confidence_threshold: config.model.confidence_threshold,
            overlap_threshold: config.model.overlap_threshold,
            class_filter: config.class_filter(),
        }
    }

    pub fn accepts_class(&self, class_id: usize) -> bool {
        self.class_filter
            .as_ref()
            .map_or(true, |filter| filter.contains(&class_id))
    }
}

/// Детектор объектов: долгий синхронный вызов на кадр
pub trait DetectorTrait {
    fn infer(&mut self, image: &RgbImage, params: &InferenceParams) -> Result<Vec<Detection>>;

    fn class_names(&self) -> &ClassNames;
}

/// Factory function to create a detector based on the dry_run flag
pub fn create_detector(config: &Config, dry_run: bool) -> Result<Box<dyn DetectorTrait>> {
    if dry_run {
        info!("Детектор: сценарные детекции (dry-run)");
        return Ok(Box::new(super::dry_run::DryRunDetector::new(resolve_names(config, None))));
    }

    info!("Загрузка модели: {:?}", config.model.path);
    Ok(Box::new(super::yolo::YoloDetector::new(config)?))
}

/// Имена классов: явный список из конфига, затем метаданные модели, затем COCO
pub fn resolve_names(config: &Config, metadata: Option<&str>) -> ClassNames {
    if !config.model.class_names.is_empty() {
        return ClassNames::new(config.model.class_names.clone());
    }

    metadata
        .and_then(ClassNames::parse_metadata)
        .unwrap_or_else(ClassNames::coco)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_filter() {
        let mut config = Config::default();
        let params = InferenceParams::from_config(&config);
        assert!(params.accepts_class(0));
        assert!(params.accepts_class(79));

        config.model.class_filter = vec![0];
        let params = InferenceParams::from_config(&config);
        assert!(params.accepts_class(0));
        assert!(!params.accepts_class(2));
    }

    #[test]
    fn test_resolve_names_priority() {
        let mut config = Config::default();
        assert_eq!(resolve_names(&config, None).len(), 80);
        assert_eq!(resolve_names(&config, Some("{0: 'enemy'}")).name(0), "enemy");
        assert_eq!(resolve_names(&config, Some("garbage")).name(0), "person");

        config.model.class_names = vec!["head".to_string(), "body".to_string()];
        assert_eq!(resolve_names(&config, Some("{0: 'enemy'}")).name(1), "body");
    }
}
