use crate::error::Result;
use crate::events::{BoundingBox, Detection};
use image::RgbImage;

use super::class_names::ClassNames;
use super::r#trait::{DetectorTrait, InferenceParams};

/// Dry-run детектор: сценарный набор детекций, плывущий по кадру
pub struct DryRunDetector {
    class_names: ClassNames,
    calls: u64,
}

impl DryRunDetector {
    pub fn new(class_names: ClassNames) -> Self {
        Self {
            class_names,
            calls: 0,
        }
    }
}

impl DetectorTrait for DryRunDetector {
    fn infer(&mut self, image: &RgbImage, params: &InferenceParams) -> Result<Vec<Detection>> {
        let (w, h) = (image.width() as f32, image.height() as f32);
        let drift = (self.calls % 100) as f32;
        self.calls += 1;

        let scripted = [
            Detection::new(BoundingBox::new(10.0 + drift, 10.0, 50.0 + drift, 50.0), 0, 0.85),
            Detection::new(BoundingBox::new(w * 0.5, h * 0.5, w * 0.5 + 80.0, h * 0.5 + 60.0), 2, 0.45),
            // выходит за правый край: оверлей должен её отбросить
            Detection::new(BoundingBox::new(w - 40.0, 20.0, w + 100.0, 60.0), 0, 0.95),
        ];

        Ok(scripted
            .into_iter()
            .filter(|d| d.confidence >= params.confidence_threshold && params.accepts_class(d.class_id))
            .collect())
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_apply_to_script() {
        let mut detector = DryRunDetector::new(ClassNames::coco());
        let image = RgbImage::new(800, 600);
        let params = InferenceParams {
            confidence_threshold: 0.5,
            overlap_threshold: 0.4,
            class_filter: None,
        };

        let detections = detector.infer(&image, &params).unwrap();
        assert_eq!(detections.len(), 2);
        assert!(detections.iter().all(|d| d.class_id == 0));
    }
}
