use crate::config::{Config, Device};
use crate::error::{OverlayError, Result};
use crate::{debug_if_enabled, overlay_error};
use crate::events::{BoundingBox, Detection};
use image::{imageops, RgbImage};
use ndarray::{s, Array4, ArrayView2, Axis, Ix2};
use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::{info, warn};

use super::class_names::ClassNames;
use super::nms::non_max_suppression;
use super::r#trait::{resolve_names, DetectorTrait, InferenceParams};

/// Серый фон паддинга, как в letterbox ultralytics
const PAD_VALUE: f32 = 114.0 / 255.0;

/// YOLOv8, экспортированный в ONNX, через ONNX Runtime
pub struct YoloDetector {
    session: Session,
    input_name: String,
    output_name: String,
    input_size: u32,
    class_names: ClassNames,
}

impl YoloDetector {
    pub fn new(config: &Config) -> Result<Self> {
        let device = config.model.device;
        let cuda = CUDAExecutionProvider::default();
        let cuda_available = device != Device::Cpu && cuda.is_available().unwrap_or(false);
        let provider = select_provider(device, cuda_available)?;

        let mut builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
        if provider == Provider::Cuda {
            let cuda = cuda.build();
            // auto: при сбое регистрации ort сам откатывается на CPU
            let cuda = if device == Device::Cuda { cuda.error_on_failure() } else { cuda };
            builder = builder.with_execution_providers([cuda])?;
        }
        let session = builder.commit_from_file(&config.model.path)?;

        match provider {
            Provider::Cuda => info!("Инференс на GPU (CUDA)"),
            Provider::Cpu if device == Device::Auto => {
                warn!("CUDA недоступна, инференс на CPU будет медленным")
            }
            Provider::Cpu => info!("Инференс на CPU"),
        }

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "images".to_string());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output0".to_string());

        let metadata = match session.metadata().and_then(|m| m.custom("names")) {
            Ok(names) => names,
            Err(e) => {
                warn!("Не удалось прочитать метаданные модели: {}", e);
                None
            }
        };
        let class_names = resolve_names(config, metadata.as_deref());

        info!(
            "Модель загружена: вход '{}', выход '{}', {} классов",
            input_name,
            output_name,
            class_names.len()
        );

        Ok(Self {
            session,
            input_name,
            output_name,
            input_size: config.model.input_size,
            class_names,
        })
    }
}

impl DetectorTrait for YoloDetector {
    fn infer(&mut self, image: &RgbImage, params: &InferenceParams) -> Result<Vec<Detection>> {
        let (input, letterbox) = letterbox(image, self.input_size);

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input.view()]?)?;
        let output = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        // [1, 4 + classes, anchors] -> [4 + classes, anchors]
        let output = output
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map_err(|e| OverlayError::Detector(format!("Неожиданная форма выхода: {}", e)))?;

        let candidates = decode(output, &letterbox, params, image.width(), image.height());
        debug_if_enabled!("YOLO: {} кандидатов до NMS", candidates.len());

        Ok(non_max_suppression(candidates, params.overlap_threshold))
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }
}

/// Провайдер исполнения ONNX Runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Cpu,
    Cuda,
}

fn select_provider(device: Device, cuda_available: bool) -> Result<Provider> {
    match (device, cuda_available) {
        (Device::Cpu, _) => Ok(Provider::Cpu),
        (_, true) => Ok(Provider::Cuda),
        (Device::Auto, false) => Ok(Provider::Cpu),
        (Device::Cuda, false) => Err(overlay_error!(
            detector,
            "[model].device = \"cuda\", но CUDA недоступна"
        )),
    }
}

/// Параметры letterbox-преобразования кадра во вход модели
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

impl Letterbox {
    fn to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Масштабирует кадр с сохранением пропорций и центрирует на квадрате `size`
fn letterbox(image: &RgbImage, size: u32) -> (Array4<f32>, Letterbox) {
    let (width, height) = image.dimensions();
    let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
    let new_width = ((width as f32 * scale).round() as u32).clamp(1, size);
    let new_height = ((height as f32 * scale).round() as u32).clamp(1, size);

    let resized = imageops::resize(image, new_width, new_height, imageops::FilterType::Triangle);
    let pad_x = (size - new_width) / 2;
    let pad_y = (size - new_height) / 2;

    let mut input = Array4::from_elem((1, 3, size as usize, size as usize), PAD_VALUE);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (ix, iy) = ((x + pad_x) as usize, (y + pad_y) as usize);
        for c in 0..3 {
            input[[0, c, iy, ix]] = f32::from(pixel[c]) / 255.0;
        }
    }

    (
        input,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        },
    )
}

/// Разбирает выход `[4 + classes, anchors]` в детекции в координатах кадра
fn decode(
    output: ArrayView2<'_, f32>,
    letterbox: &Letterbox,
    params: &InferenceParams,
    frame_width: u32,
    frame_height: u32,
) -> Vec<Detection> {
    let (w, h) = (frame_width as f32, frame_height as f32);
    let mut candidates = Vec::new();

    for anchor in output.axis_iter(Axis(1)) {
        let scores = anchor.slice(s![4..]);
        let Some((class_id, &confidence)) = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
        else {
            continue;
        };

        if confidence < params.confidence_threshold || !params.accepts_class(class_id) {
            continue;
        }

        let bbox = BoundingBox::from_center(anchor[0], anchor[1], anchor[2], anchor[3]);
        let (x1, y1) = letterbox.to_frame(bbox.x1, bbox.y1);
        let (x2, y2) = letterbox.to_frame(bbox.x2, bbox.y2);

        // рамки обрезаются по кадру, как clip_boxes в ultralytics
        let bbox = BoundingBox::new(x1.clamp(0.0, w), y1.clamp(0.0, h), x2.clamp(0.0, w), y2.clamp(0.0, h));
        candidates.push(Detection::new(bbox, class_id, confidence));
    }

    candidates
}
