use font8x8::{UnicodeFonts, BASIC_FONTS};
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use super::draw_list::{DrawCommand, DrawList, Rgba8, GLYPH_SIZE};

fn paint(color: Rgba8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = false;
    paint
}

/// Растеризует список команд в pixmap, предварительно очистив его до прозрачного
pub fn rasterize(list: &DrawList, pixmap: &mut Pixmap) {
    pixmap.fill(Color::TRANSPARENT);

    for command in &list.commands {
        match command {
            DrawCommand::StrokeRect { rect, color, thickness } => {
                let Some(rect) = Rect::from_ltrb(rect.x1, rect.y1, rect.x2, rect.y2) else {
                    continue;
                };
                let path = PathBuilder::from_rect(rect);
                let stroke = Stroke {
                    width: *thickness,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &paint(*color), &stroke, Transform::identity(), None);
            }
            DrawCommand::FillRect { rect, color } => {
                if let Some(rect) = Rect::from_ltrb(rect.x1, rect.y1, rect.x2, rect.y2) {
                    pixmap.fill_rect(rect, &paint(*color), Transform::identity(), None);
                }
            }
            DrawCommand::Text { x, y, text, color, scale } => {
                draw_text(pixmap, *x, *y, text, *color, *scale);
            }
        }
    }
}

fn draw_text(pixmap: &mut Pixmap, x: f32, y: f32, text: &str, color: Rgba8, scale: u32) {
    let paint = paint(color);
    let cell = scale as f32;
    let advance = (GLYPH_SIZE * scale) as f32;

    for (index, c) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(c) else {
            continue;
        };
        let origin_x = x + index as f32 * advance;

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                // младший бит - левый пиксель
                if bits & (1 << col) == 0 {
                    continue;
                }
                if let Some(rect) = Rect::from_xywh(
                    origin_x + col as f32 * cell,
                    y + row as f32 * cell,
                    cell,
                    cell,
                ) {
                    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
        }
    }
}

/// Упаковывает premultiplied RGBA в 0xAARRGGBB для softbuffer
pub fn pack_argb(pixmap: &Pixmap, out: &mut [u32]) {
    for (dst, px) in out.iter_mut().zip(pixmap.pixels()) {
        *dst = (u32::from(px.alpha()) << 24)
            | (u32::from(px.red()) << 16)
            | (u32::from(px.green()) << 8)
            | u32::from(px.blue());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::{BoundingBox, Detection};
    use crate::services::detector::ClassNames;
    use crate::services::render::{build_draw_list, RenderStyle};

    #[test]
    fn test_box_is_rasterized_and_interior_stays_transparent() {
        let list = build_draw_list(
            &[Detection::new(BoundingBox::new(10.0, 30.0, 50.0, 70.0), 0, 0.85)],
            100,
            100,
            &ClassNames::coco(),
            &RenderStyle::from_config(&Config::default()),
        );
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        rasterize(&list, &mut pixmap);

        let edge = pixmap.pixel(10, 50).unwrap();
        assert_eq!((edge.red(), edge.green(), edge.alpha()), (0, 255, 255));

        let interior = pixmap.pixel(30, 50).unwrap();
        assert_eq!(interior.alpha(), 0);
    }

    #[test]
    fn test_empty_list_clears_surface() {
        let mut pixmap = Pixmap::new(8, 8).unwrap();
        pixmap.fill(Color::WHITE);
        rasterize(&DrawList::empty(8, 8), &mut pixmap);

        assert!(pixmap.pixels().iter().all(|px| px.alpha() == 0));
    }

    #[test]
    fn test_text_lights_up_glyph_pixels() {
        let mut pixmap = Pixmap::new(16, 8).unwrap();
        draw_text(&mut pixmap, 0.0, 0.0, "A", Rgba8::new(255, 255, 255, 255), 1);

        let lit = pixmap.pixels().iter().filter(|px| px.alpha() == 255).count();
        assert!(lit > 0);
        // вторая ячейка пуста
        assert!((8..16).all(|x| (0..8).all(|y| pixmap.pixel(x, y).unwrap().alpha() == 0)));
    }

    #[test]
    fn test_pack_argb() {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(Color::from_rgba8(255, 0, 0, 255));
        let mut out = [0u32; 1];
        pack_argb(&pixmap, &mut out);
        assert_eq!(out[0], 0xFFFF_0000);
    }
}
