use crate::config::Config;
use crate::trace_if_enabled;
use crate::events::{BoundingBox, Detection};
use crate::services::detector::ClassNames;

/// Ширина и высота глифа font8x8 в пикселях при масштабе 1
pub const GLYPH_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

pub mod colors {
    use super::Rgba8;

    /// Уверенность не ниже порога
    pub const CONFIDENT: Rgba8 = Rgba8::new(0, 255, 0, 255);
    /// Уверенность ниже порога
    pub const UNCERTAIN: Rgba8 = Rgba8::new(255, 0, 0, 255);
    /// Не чистый чёрный: на Windows чёрный - цветовой ключ прозрачности
    pub const LABEL_PLATE: Rgba8 = Rgba8::new(16, 16, 16, 178);
    pub const LABEL_TEXT: Rgba8 = Rgba8::new(255, 255, 255, 255);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    StrokeRect {
        rect: BoundingBox,
        color: Rgba8,
        thickness: f32,
    },
    FillRect {
        rect: BoundingBox,
        color: Rgba8,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        color: Rgba8,
        scale: u32,
    },
}

/// Содержимое одного кадра оверлея. Пустой список очищает поверхность.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Количество нарисованных рамок детекций
    pub fn box_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::StrokeRect { .. }))
            .count()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub confidence_color_threshold: f32,
    pub box_thickness: f32,
    pub label_scale: u32,
}

impl RenderStyle {
    pub fn from_config(config: &Config) -> Self {
        Self {
            confidence_color_threshold: config.overlay.confidence_color_threshold,
            box_thickness: config.overlay.box_thickness,
            label_scale: config.overlay.label_scale,
        }
    }

    pub fn box_color(&self, confidence: f32) -> Rgba8 {
        if confidence >= self.confidence_color_threshold {
            colors::CONFIDENT
        } else {
            colors::UNCERTAIN
        }
    }

    pub fn text_size(&self, text: &str) -> (f32, f32) {
        let glyph = (GLYPH_SIZE * self.label_scale) as f32;
        (glyph * text.chars().count() as f32, glyph)
    }
}

pub fn format_label(class_name: &str, confidence: f32) -> String {
    format!("{}: {:.2}", class_name, confidence)
}

/// Проход рендера: рамка и подпись на подложке для каждой детекции внутри кадра.
///
/// Детекция с любой координатой вне `[0,width]×[0,height]` молча отбрасывается.
pub fn build_draw_list(
    detections: &[Detection],
    width: u32,
    height: u32,
    class_names: &ClassNames,
    style: &RenderStyle,
) -> DrawList {
    let mut list = DrawList::empty(width, height);

    for detection in detections {
        let bbox = detection.bbox;
        if !bbox.within(width, height) {
            trace_if_enabled!("Детекция {} вне кадра {}x{}, пропуск", detection, width, height);
            continue;
        }

        let label = format_label(&class_names.name(detection.class_id), detection.confidence);
        let (text_width, text_height) = style.text_size(&label);

        list.commands.push(DrawCommand::StrokeRect {
            rect: bbox,
            color: style.box_color(detection.confidence),
            thickness: style.box_thickness,
        });
        list.commands.push(DrawCommand::FillRect {
            rect: BoundingBox::new(
                bbox.x1,
                bbox.y1 - text_height - 4.0,
                bbox.x1 + text_width + 4.0,
                bbox.y1,
            ),
            color: colors::LABEL_PLATE,
        });
        list.commands.push(DrawCommand::Text {
            x: bbox.x1 + 2.0,
            y: bbox.y1 - text_height - 2.0,
            text: label,
            color: colors::LABEL_TEXT,
            scale: style.label_scale,
        });
    }

    list
}
