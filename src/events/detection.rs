use std::fmt;

/// Рамка в локальных пиксельных координатах кадра
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Рамка из центра и размеров (формат выхода YOLO)
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union двух рамок
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    /// Все четыре координаты лежат в [0,width]×[0,height]
    pub fn within(&self, width: u32, height: u32) -> bool {
        let (w, h) = (width as f32, height as f32);
        let in_x = |x: f32| (0.0..=w).contains(&x);
        let in_y = |y: f32| (0.0..=h).contains(&y);
        in_x(self.x1) && in_x(self.x2) && in_y(self.y1) && in_y(self.y2)
    }
}

/// Результат детекции одного объекта
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, class_id: usize, confidence: f32) -> Self {
        Self {
            bbox,
            class_id,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {:.2} ({:.0},{:.0})-({:.0},{:.0})",
            self.class_id, self.confidence, self.bbox.x1, self.bbox.y1, self.bbox.x2, self.bbox.y2
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_bounds() {
        assert!(BoundingBox::new(10.0, 10.0, 50.0, 50.0).within(800, 600));
        assert!(BoundingBox::new(0.0, 0.0, 800.0, 600.0).within(800, 600));
        assert!(!BoundingBox::new(10.0, 10.0, 900.0, 50.0).within(800, 600));
        assert!(!BoundingBox::new(-1.0, 10.0, 50.0, 50.0).within(800, 600));
        assert!(!BoundingBox::new(10.0, 10.0, 50.0, 601.0).within(800, 600));
    }

    #[test]
    fn test_iou() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!((a.iou(&a) - 1.0).abs() < f32::EPSILON);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(a.iou(&c), 0.0);
    }

    #[test]
    fn test_from_center() {
        let bbox = BoundingBox::from_center(30.0, 30.0, 40.0, 20.0);
        assert_eq!(bbox, BoundingBox::new(10.0, 20.0, 50.0, 40.0));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let d = Detection::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0, 1.3);
        assert_eq!(d.confidence, 1.0);
    }
}
