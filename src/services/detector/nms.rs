use crate::events::Detection;

/// Предел числа детекций на кадр после подавления
pub const MAX_DETECTIONS: usize = 300;

/// Жадное подавление немаксимумов внутри каждого класса.
///
/// Кандидат отбрасывается, если его IoU с уже принятой рамкой того же класса
/// больше `overlap_threshold`.
pub fn non_max_suppression(mut candidates: Vec<Detection>, overlap_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(candidates.len().min(MAX_DETECTIONS));
    for candidate in candidates {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > overlap_threshold
        });

        if !suppressed {
            kept.push(candidate);
            if kept.len() == MAX_DETECTIONS {
                break;
            }
        }
    }

    kept
}
