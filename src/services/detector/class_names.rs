use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::BTreeMap;

const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

static COCO: Lazy<ClassNames> =
    Lazy::new(|| ClassNames::new(COCO_CLASSES.iter().map(|s| s.to_string()).collect()));

/// Отображение classId -> имя класса
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn coco() -> Self {
        COCO.clone()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Имя класса; для неизвестного id возвращает `class_<id>`
    pub fn name(&self, class_id: usize) -> Cow<'_, str> {
        match self.names.get(class_id) {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(format!("class_{}", class_id)),
        }
    }

    /// Разбирает метаданные `names` из ONNX-экспорта ultralytics:
    /// `{0: 'person', 1: 'bicycle', ...}`
    pub fn parse_metadata(raw: &str) -> Option<Self> {
        let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
        let mut names = BTreeMap::new();
        let mut rest = body;

        while !rest.trim().is_empty() {
            let (key, after) = rest.split_once(':')?;
            let id: usize = key.trim_matches(|c: char| c == ',' || c.is_whitespace()).parse().ok()?;

            let after = after.trim_start();
            let quote = after.chars().next()?;
            if quote != '\'' && quote != '"' {
                return None;
            }

            let after = &after[1..];
            let end = after.find(quote)?;
            names.insert(id, after[..end].to_string());
            rest = &after[end + 1..];
        }

        // id должны идти подряд с нуля
        if names.keys().enumerate().any(|(i, id)| i != *id) {
            return None;
        }

        Some(Self::new(names.into_values().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_defaults() {
        let names = ClassNames::coco();
        assert_eq!(names.len(), 80);
        assert_eq!(names.name(0), "person");
        assert_eq!(names.name(79), "toothbrush");
        assert_eq!(names.name(80), "class_80");
    }

    #[test]
    fn test_parse_metadata() {
        let names = ClassNames::parse_metadata("{0: 'person', 1: \"traffic light\", 2: 'dog'}").unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names.name(1), "traffic light");
        assert_eq!(names.name(2), "dog");
    }

    #[test]
    fn test_parse_metadata_rejects_garbage() {
        assert!(ClassNames::parse_metadata("person, dog").is_none());
        assert!(ClassNames::parse_metadata("{0: person}").is_none());
        assert!(ClassNames::parse_metadata("{0: 'a', 2: 'b'}").is_none());
    }
}
